//! Maintenance utilities for Xcode project descriptors.
//!
//! - [`sources`]: register every source file under a directory explicitly.
//! - [`frameworks`]: link and embed prebuilt xcframeworks.
//!
//! Both run through [`pipeline::run`]: read the descriptor, skip if a previous
//! run already applied the change, resolve every insertion point, then write
//! the new text in one atomic replace.

pub mod config;
pub mod frameworks;
pub mod outcome;
pub mod pipeline;
pub mod project;
pub mod sources;
pub mod writeback;
