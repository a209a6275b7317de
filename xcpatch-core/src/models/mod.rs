//! Transient views used to compute the next version of a descriptor.
//!
//! - [`EntityRecord`]: one file or bundle to register, with its derived ids.
//! - [`Anchor`]: where in the descriptor a category of entries is inserted.

mod anchor;
mod entity;

pub use anchor::*;
pub use entity::*;
