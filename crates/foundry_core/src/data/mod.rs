//! Content definitions.
//!
//! Floors, status effects, unit types and generator types are pure data that
//! can be written in RON and merged into a [`ContentRegistry`].
//!
//! **Note:** This module contains no IO - it only parses strings. Reading
//! content files is left to the caller.

mod registry;
mod standard;

pub use registry::{ContentData, ContentRegistry};
pub use standard::{status_ids, BLAST_COMPOUND};
