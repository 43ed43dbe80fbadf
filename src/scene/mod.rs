//! Authoritative part storage.
//!
//! Every loaded part lives in one arena keyed by [`PartKey`]. The name index
//! and per-model part lists are secondary indices over that arena, never an
//! independent source of truth.

mod part;
mod registry;

pub use part::{Appearance, Geometry, Model, ModelId, Part, PartKey};
pub use registry::{NewPart, PartRegistry, Resolution};
