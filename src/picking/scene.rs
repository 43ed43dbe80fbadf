//! Color-tagged proxy registry answering pixel-to-part queries.

use std::sync::Arc;

use glam::Vec2;
use rustc_hash::FxHashMap;
use slotmap::SecondaryMap;

use super::color::{PickColor, PickColorAllocator};
use super::target::{PickPass, PickTarget};
use crate::camera::Camera;
use crate::error::StrataError;
use crate::scene::{Geometry, PartKey};

/// Flat proxy drawn for one part in the picking pass.
#[derive(Debug, Clone)]
pub struct PickProxy {
    /// Part the proxy stands for.
    pub part: PartKey,
    /// Unique solid color written by the proxy.
    pub color: PickColor,
    /// Shared world-space geometry of the part.
    pub geometry: Arc<Geometry>,
    visible: bool,
}

impl PickProxy {
    /// Whether the proxy takes part in pick passes.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Proxy set for the picking pass.
///
/// The color map is a secondary index over the proxies: both are updated
/// together on every registration so a color resolves to exactly one live
/// part.
#[derive(Debug, Default)]
pub struct PickingScene {
    allocator: PickColorAllocator,
    proxies: SecondaryMap<PartKey, PickProxy>,
    by_color: FxHashMap<PickColor, PartKey>,
    generation: u64,
}

impl PickingScene {
    /// Empty scene over the full 24-bit id space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty scene drawing colors from `allocator`.
    #[must_use]
    pub fn with_allocator(allocator: PickColorAllocator) -> Self {
        Self {
            allocator,
            ..Self::default()
        }
    }

    /// Register a proxy for `part`. Registering an already known part keeps
    /// its color and refreshes geometry and visibility.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::PickColorsExhausted`] when no color is free;
    /// nothing is registered in that case.
    pub fn register(
        &mut self,
        part: PartKey,
        geometry: Arc<Geometry>,
        visible: bool,
    ) -> Result<PickColor, StrataError> {
        if let Some(proxy) = self.proxies.get_mut(part) {
            proxy.geometry = geometry;
            proxy.visible = visible;
            self.generation += 1;
            return Ok(proxy.color);
        }
        let color = self.allocator.allocate()?;
        let _ = self.by_color.insert(color, part);
        let _ = self.proxies.insert(
            part,
            PickProxy {
                part,
                color,
                geometry,
                visible,
            },
        );
        self.generation += 1;
        Ok(color)
    }

    /// Remove the proxy of `part` and release its color.
    pub fn unregister(&mut self, part: PartKey) -> Option<PickColor> {
        let proxy = self.proxies.remove(part)?;
        let _ = self.by_color.remove(&proxy.color);
        self.allocator.release(proxy.color);
        self.generation += 1;
        Some(proxy.color)
    }

    /// Include or exclude a proxy from pick passes. Returns `true` when the
    /// visibility changed.
    pub fn set_visible(&mut self, part: PartKey, visible: bool) -> bool {
        match self.proxies.get_mut(part) {
            Some(proxy) if proxy.visible != visible => {
                proxy.visible = visible;
                self.generation += 1;
                true
            }
            _ => false,
        }
    }

    /// Color currently tagging `part`.
    #[must_use]
    pub fn color_of(&self, part: PartKey) -> Option<PickColor> {
        self.proxies.get(part).map(|p| p.color)
    }

    /// Part currently tagged with `color`.
    #[must_use]
    pub fn part_for(&self, color: PickColor) -> Option<PartKey> {
        self.by_color.get(&color).copied()
    }

    /// Proxy of `part`.
    #[must_use]
    pub fn proxy(&self, part: PartKey) -> Option<&PickProxy> {
        self.proxies.get(part)
    }

    /// Proxies drawn by a pick pass.
    pub fn visible_proxies(&self) -> impl Iterator<Item = &PickProxy> {
        self.proxies.values().filter(|p| p.visible)
    }

    /// Number of registered proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether no proxy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Number of colors currently assigned.
    #[must_use]
    pub fn live_colors(&self) -> usize {
        self.allocator.live()
    }

    /// Counter bumped on every change to the proxy set, so GPU targets can
    /// skip re-uploading unchanged proxies.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve the part rendered at pixel `(x, y)` (top-left origin).
    ///
    /// Renders the visible proxies through the camera's view-offset
    /// projection into `target` and decodes the texel. Colors released before
    /// this pass become reusable once it starts.
    ///
    /// # Errors
    ///
    /// Propagates render or readback failures from `target`.
    pub fn pick(
        &mut self,
        camera: &Camera,
        pixel: Vec2,
        target: &mut dyn PickTarget,
    ) -> Result<Option<PartKey>, StrataError> {
        self.allocator.recycle_released();
        let pass = PickPass {
            view_proj: camera.pick_matrix(pixel.x, pixel.y),
            scene: self,
        };
        let rgba = target.render_pixel(&pass)?;
        let Some(color) = PickColor::from_rgba(rgba) else {
            return Ok(None);
        };
        let part = self.part_for(color);
        if part.is_none() {
            log::warn!("pick color {:#08x} maps to no live part", color.id());
        }
        Ok(part)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use slotmap::SlotMap;

    use super::*;
    use crate::picking::software::SoftwarePickTarget;

    // Off-center so the pick ray never lands on the shared diagonal.
    fn quad(z: f32) -> Arc<Geometry> {
        Arc::new(Geometry::new(
            vec![
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.5, -1.0, z),
                Vec3::new(1.5, 1.0, z),
                Vec3::new(-1.0, 1.0, z),
            ],
            vec![0, 1, 2, 0, 2, 3],
        ))
    }

    fn keys(n: usize) -> Vec<PartKey> {
        let mut arena: SlotMap<PartKey, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn center(camera: &Camera) -> Vec2 {
        Vec2::new(camera.viewport.0 as f32, camera.viewport.1 as f32) * 0.5
    }

    #[test]
    fn colors_are_a_bijection_onto_live_parts() {
        let parts = keys(4);
        let mut scene = PickingScene::new();
        for &part in &parts {
            let _ = scene.register(part, quad(0.0), true).unwrap();
        }
        let _ = scene.unregister(parts[1]);
        for &part in [parts[0], parts[2], parts[3]].iter() {
            let color = scene.color_of(part).unwrap();
            assert_eq!(scene.part_for(color), Some(part));
        }
        assert_eq!(scene.live_colors(), 3);
        assert_eq!(scene.color_of(parts[1]), None);
    }

    #[test]
    fn released_color_waits_for_next_pass() {
        let parts = keys(3);
        let mut scene = PickingScene::new();
        let first = scene.register(parts[0], quad(0.0), true).unwrap();
        let _ = scene.unregister(parts[0]);
        let second = scene.register(parts[1], quad(0.0), true).unwrap();
        assert_ne!(first, second);

        let camera = Camera::default();
        let mut target = SoftwarePickTarget::default();
        let _ = scene.pick(&camera, center(&camera), &mut target).unwrap();
        let third = scene.register(parts[2], quad(0.0), true).unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn exhaustion_refuses_registration() {
        let parts = keys(3);
        let mut scene =
            PickingScene::with_allocator(PickColorAllocator::with_limit(2));
        let _ = scene.register(parts[0], quad(0.0), true).unwrap();
        let _ = scene.register(parts[1], quad(0.0), true).unwrap();
        assert!(matches!(
            scene.register(parts[2], quad(0.0), true),
            Err(StrataError::PickColorsExhausted)
        ));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.proxy(parts[2]).map(|p| p.color), None);
    }

    #[test]
    fn pick_returns_nearest_visible_part() {
        let parts = keys(2);
        let mut scene = PickingScene::new();
        let _ = scene.register(parts[0], quad(1.0), true).unwrap();
        let _ = scene.register(parts[1], quad(-1.0), true).unwrap();
        let camera = Camera::default();
        let mut target = SoftwarePickTarget::default();

        let hit = scene.pick(&camera, center(&camera), &mut target).unwrap();
        assert_eq!(hit, Some(parts[0]));

        assert!(scene.set_visible(parts[0], false));
        let hit = scene.pick(&camera, center(&camera), &mut target).unwrap();
        assert_eq!(hit, Some(parts[1]));

        assert!(scene.set_visible(parts[1], false));
        let hit = scene.pick(&camera, center(&camera), &mut target).unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn pick_outside_geometry_is_empty() {
        let parts = keys(1);
        let mut scene = PickingScene::new();
        let _ = scene.register(parts[0], quad(0.0), true).unwrap();
        let camera = Camera::default();
        let mut target = SoftwarePickTarget::default();
        let hit = scene
            .pick(&camera, Vec2::new(5.0, 5.0), &mut target)
            .unwrap();
        assert_eq!(hit, None);
    }
}
