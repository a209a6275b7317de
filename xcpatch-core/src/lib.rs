//! Structural patching for Xcode project descriptors (`project.pbxproj`).
//!
//! # Core Concepts
//!
//! - [`ObjectId`]: deterministic 24-character identifiers derived from seeds.
//! - [`Document`]: the descriptor text plus a parsed tree used to locate
//!   insertion points.
//! - [`Anchor`]: a section sentinel or an object key that receives new lines.
//! - [`PatchPlan`]: insertions collected up front and committed only when
//!   every anchor resolves.

pub mod document;
pub mod error;
pub mod id;
pub mod models;
pub mod patch;
pub mod render;

pub use document::Document;
pub use error::{AnchorError, DocumentError, PatchError};
pub use id::{IdGenerator, IdRole, ObjectId};
pub use models::*;
pub use patch::PatchPlan;
