//! An8 Core - Anim8or scene parsing and conversion.
//!
//! This crate provides:
//!
//! - **An8 support**: schema-driven chunk parsing and document types
//! - **Geometry**: polygon meshes, primitive tessellation, normal synthesis
//! - **Skinning**: bone frames and influence-based vertex weights
//! - **Scene description**: node tree, materials, skin controllers and
//!   sampled animations, ready for an interchange writer
//!
//! # Example
//!
//! ```ignore
//! use an8_core::an8::load_an8;
//! use an8_core::ConvertOptions;
//!
//! // Convert an An8 file
//! let scene = load_an8("walker.an8", &ConvertOptions::default())?;
//! println!("Converted {} nodes, {} polygons",
//!     scene.graph.len(),
//!     scene.total_polygon_count());
//! ```

pub mod an8;
pub mod animation;
pub mod config;
pub mod geometry;
pub mod mesh;
mod normals;
pub mod scene;
pub mod skin;
pub mod tessellate;

// Re-export commonly used types
pub use an8::{convert_an8_from_string, load_an8, LoadError, LoadResult};
pub use config::ConvertOptions;
pub use geometry::Geometry;
pub use mesh::Mesh;
pub use scene::{Controller, Material, NodeId, SceneDescription, SceneGraph};
