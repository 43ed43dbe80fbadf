use glam::Mat4;

use super::scene::PickingScene;
use crate::error::StrataError;

/// One 1×1 picking render: the narrowed view-projection plus the proxies to
/// draw through it.
#[derive(Debug, Clone, Copy)]
pub struct PickPass<'a> {
    /// View matrix multiplied by the view-offset projection of the queried
    /// pixel. NDC `(0, 0)` is the query position.
    pub view_proj: Mat4,
    /// Source of the visible color-tagged proxies.
    pub scene: &'a PickingScene,
}

/// An offscreen surface able to render a [`PickPass`] and hand back the
/// single texel it produced.
///
/// The target must draw proxies flat, unlit and unblended with a depth test,
/// and clear to `[0, 0, 0, 0]` so an empty pixel decodes to no part.
pub trait PickTarget {
    /// Render the pass and read back its only pixel as RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the render or the readback fails.
    fn render_pixel(&mut self, pass: &PickPass<'_>) -> Result<[u8; 4], StrataError>;
}
