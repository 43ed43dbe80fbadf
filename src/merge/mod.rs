//! Merged-geometry builder.
//!
//! Concatenates per-part geometry into a few large batches (one for the
//! scene, one per model, or several per model under a vertex cap) and keeps
//! a map from part to its contiguous sub-range so state changes can be
//! re-encoded in place.

mod batch;
mod builder;

pub use batch::{BatchKey, MergedBatch, PartRange};
pub use builder::MergedGeometry;
