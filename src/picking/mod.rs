//! Pixel-to-part resolution through a color-coded offscreen pass.
//!
//! Every part gets a flat proxy tagged with a unique 24-bit color. A pick
//! narrows the camera to the queried pixel, renders the proxies into a 1×1
//! target and decodes the single texel back to a part.

mod color;
mod scene;
#[cfg(test)]
pub(crate) mod software;
mod target;

pub use color::{PickColor, PickColorAllocator, MAX_PICK_ID};
pub use scene::{PickProxy, PickingScene};
pub use target::{PickPass, PickTarget};
