//! Per-part interaction state and the color-state encoder.
//!
//! Flags live in side tables keyed by [`crate::scene::PartKey`], separate
//! from geometry. [`encode`] turns a part's base appearance plus its
//! gathered [`PartState`] into the bytes the merged buffers carry.

mod encoder;
mod holders;

pub use encoder::{encode, PartState};
pub(crate) use holders::dedup_keys;
pub use holders::{CustomColors, Highlight, InteractionState, PartSet, SelectMode};
