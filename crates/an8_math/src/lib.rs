//! Math kernel for the An8 converter.
//!
//! Vectors and quaternions come straight from glam's double precision types
//! (`DVec2`, `DVec3`, `DQuat`). On top of those this crate adds:
//!
//! - [`QuatExt`]: the quaternion helpers the An8 pipeline leans on
//!   (closed-form vector rotation, arc construction)
//! - [`Matrix4`]: a row-major 4x4 matrix with an adjugate inverse that
//!   falls back to identity for singular input

// Re-export glam for convenience
pub use glam::*;

mod matrix;
mod quat;

pub use matrix::Matrix4;
pub use quat::QuatExt;

/// Tolerance used by the approximate comparisons in this workspace.
pub const EPSILON: f64 = 1e-6;
