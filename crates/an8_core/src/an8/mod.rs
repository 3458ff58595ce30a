//! An8 (Anim8or) document support.
//!
//! This module parses the An8 chunk format and converts documents into a
//! [`SceneDescription`](crate::scene::SceneDescription).
//!
//! ## Supported Chunks
//!
//! - `header`, `description`, `environment`, `texture`, `material`
//! - `object` with `mesh`, `sphere`, `cube`, `cylinder`, `group` and
//!   `namedobject` components
//! - `figure` bone hierarchies with influences and attached named objects
//! - `sequence` joint-angle float tracks
//!
//! ## Not Converted
//!
//! - `subdivision`, `pathcom`, `textcom`, `modifier` and `image`
//!   components (placed as empty nodes)
//! - `scene` chunks (cameras, lights, object placement)
//! - Point, quaternion and boolean key tracks
//!
//! # Example
//!
//! ```ignore
//! use an8_core::an8::load_an8;
//! use an8_core::ConvertOptions;
//!
//! let scene = load_an8("path/to/walker.an8", &ConvertOptions::default())?;
//! println!("Converted {} geometries, {} animations",
//!     scene.geometries.len(),
//!     scene.animations.len());
//! ```

mod reader;
mod schema;

pub mod figure;
pub mod object;
pub mod parser;
pub mod types;

mod loader;

pub use figure::{Bone, Figure, FloatKey, JointAngle, Sequence};
pub use loader::*;
pub use object::{Component, NamedObject, Object};
pub use parser::{parse_an8, ParseError, ParseResult, WeightRecord};
pub use types::An8Document;
