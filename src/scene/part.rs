use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Stable arena key for a loaded part.
    ///
    /// Keys are generational: a key held after its part was unloaded never
    /// resolves to a part loaded later.
    pub struct PartKey;
}

/// Identifier of a loaded (or loading) model, assigned in open order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u32);

impl ModelId {
    /// Wrap a raw model number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw model number.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.0)
    }
}

/// Resolved color and opacity of a part, as 8-bit channels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub struct Appearance {
    /// sRGB color.
    pub color: [u8; 3],
    /// Opacity, `0` fully transparent, `255` opaque.
    pub opacity: u8,
}

impl Appearance {
    /// An appearance with an explicit opacity.
    #[must_use]
    pub const fn new(color: [u8; 3], opacity: u8) -> Self {
        Self { color, opacity }
    }

    /// A fully opaque appearance.
    #[must_use]
    pub const fn opaque(color: [u8; 3]) -> Self {
        Self::new(color, u8::MAX)
    }

    /// Pack into the RGBA layout stored in merged color arrays.
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.color[0], self.color[1], self.color[2], self.opacity]
    }

    /// Whether nothing of the part would be drawn.
    #[must_use]
    pub const fn is_invisible(self) -> bool {
        self.opacity == 0
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::opaque([200, 200, 200])
    }
}

/// Indexed triangle geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Geometry from positions and triangle-list indices.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }

    /// A copy with every position transformed by `transform`.
    #[must_use]
    pub fn transformed(&self, transform: &Mat4) -> Self {
        if *transform == Mat4::IDENTITY {
            return self.clone();
        }
        Self {
            positions: self
                .positions
                .iter()
                .map(|&p| transform.transform_point3(p))
                .collect(),
            indices: self.indices.clone(),
        }
    }

    /// Complete triangles, skipping any that reference missing vertices.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = *self.positions.get(tri[0] as usize)?;
            let b = *self.positions.get(tri[1] as usize)?;
            let c = *self.positions.get(tri[2] as usize)?;
            Some([a, b, c])
        })
    }
}

/// A loaded part: world-space geometry plus its base appearance.
///
/// Interaction state never lives here; it is kept in the side tables of
/// [`crate::state::InteractionState`] so the base stays untouched.
#[derive(Debug, Clone)]
pub struct Part {
    /// Owning model.
    pub model: ModelId,
    /// Local name. Not unique: several parts may share it.
    pub name: String,
    /// World-space geometry, shared with the picking proxy.
    pub geometry: Arc<Geometry>,
    /// Appearance as decoded.
    pub base: Appearance,
}

/// A loaded model: metadata plus the parts it contributed.
#[derive(Debug, Clone)]
pub struct Model {
    /// Model identifier.
    pub id: ModelId,
    /// Source GUID.
    pub guid: String,
    /// Display name.
    pub name: String,
    pub(super) parts: Vec<PartKey>,
}

impl Model {
    /// Keys of the parts this model contributed, in decode order.
    #[must_use]
    pub fn parts(&self) -> &[PartKey] {
        &self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformed_moves_positions_only() {
        let geometry =
            Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        let moved =
            geometry.transformed(&Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(moved.indices, geometry.indices);
        assert_eq!(moved.positions[1], Vec3::new(1.0, 0.0, 5.0));
    }

    #[test]
    fn triangles_skip_dangling_indices() {
        let geometry =
            Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2, 0, 1, 9]);
        assert_eq!(geometry.triangles().count(), 1);
    }

    #[test]
    fn rgba_packs_opacity_last() {
        assert_eq!(Appearance::new([1, 2, 3], 4).to_rgba(), [1, 2, 3, 4]);
        assert!(Appearance::new([1, 2, 3], 0).is_invisible());
    }
}
