//! Read-only queries and picking.

use glam::Vec2;

use super::{resolver, PickHit, Viewer};
use crate::error::StrataError;
use crate::picking::PickTarget;
use crate::preview::Aabb;
use crate::scene::{Appearance, Model, ModelId, PartKey, Resolution};

/// Scene and composition counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewerStats {
    /// Loaded models.
    pub models: usize,
    /// Loaded parts.
    pub parts: usize,
    /// Merged draw batches.
    pub batches: usize,
    /// Merged vertices.
    pub vertices: usize,
    /// Merged indices.
    pub indices: usize,
    /// Picking colors in use.
    pub live_pick_colors: usize,
    /// Parts re-encoded by patches since the viewer was created.
    pub patched_parts: u64,
    /// Loads not yet folded in.
    pub pending_loads: usize,
    /// Commands waiting for loads.
    pub deferred_commands: usize,
}

impl Viewer {
    /// Part at the normalized pointer `position`, or `None` over background.
    ///
    /// Renders the picking proxies through a 1×1 view-offset projection of
    /// the current camera. Parts at zero opacity are not drawn, so the pick
    /// falls through to whatever lies behind them.
    ///
    /// # Errors
    ///
    /// Propagates render or readback failures from `target`.
    pub fn pick(
        &mut self,
        position: Vec2,
        target: &mut dyn PickTarget,
    ) -> Result<Option<PickHit>, StrataError> {
        let (width, height) = self.camera.viewport;
        let pixel = position * Vec2::new(width as f32, height as f32);
        let Some(part) = self.picking.pick(&self.camera, pixel, target)? else {
            return Ok(None);
        };
        Ok(self.registry.part(part).map(|p| PickHit {
            part,
            model: p.model,
            id: p.name.clone(),
        }))
    }

    /// Loaded models in load order.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        self.registry.models()
    }

    /// Parts of a loaded model; empty for unknown models.
    #[must_use]
    pub fn parts_of(&self, model: ModelId) -> &[PartKey] {
        self.registry.parts_of(model)
    }

    /// Resolve ids to part keys.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Resolution {
        self.registry.resolve(ids)
    }

    /// Appearance the encoder currently assigns to `part`.
    #[must_use]
    pub fn resolved_appearance(&self, part: PartKey) -> Option<Appearance> {
        let resolve = resolver(&self.state, &self.options.display);
        self.registry.part(part).map(|p| resolve(part, p))
    }

    /// Bounds of every loaded part.
    #[must_use]
    pub fn scene_bounds(&self) -> Option<Aabb> {
        self.registry
            .iter()
            .filter_map(|(_, part)| Aabb::from_points(&part.geometry.positions))
            .reduce(|a, b| a.union(&b))
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        ViewerStats {
            models: self.registry.models().len(),
            parts: self.registry.len(),
            batches: self.merged.batch_count(),
            vertices: self.merged.vertex_count(),
            indices: self.merged.index_count(),
            live_pick_colors: self.picking.live_colors(),
            patched_parts: self.merged.patched_parts(),
            pending_loads: self.loader.in_flight(),
            deferred_commands: self.deferred.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::super::command::ColorSpec;
    use super::super::fixtures::{placed_source, pointer_at, quad_source, viewer};
    use super::*;
    use crate::engine::command::ViewerCommand;
    use crate::options::Options;
    use crate::picking::software::SoftwarePickTarget;

    #[test]
    fn transparent_part_falls_through_to_part_behind() {
        let mut viewer = viewer(Options::default());
        let _ = viewer.open_model(placed_source("A", &[("front", 0.0, 2.0), ("back", 0.0, -2.0)]));
        let _ = viewer.finish_loads().unwrap();
        let mut target = SoftwarePickTarget::default();
        let at = pointer_at(&viewer, 0.0);

        let hit = viewer.pick(at, &mut target).unwrap().unwrap();
        assert_eq!(hit.id, "front");

        let _ = viewer
            .color(ColorSpec {
                ids: vec!["front".to_owned()],
                color: [0, 0, 0],
                opacity: 0,
            })
            .unwrap();
        let hit = viewer.pick(at, &mut target).unwrap().unwrap();
        assert_eq!(hit.id, "back");

        let _ = viewer
            .execute(ViewerCommand::Hide {
                ids: vec!["back".to_owned()],
            })
            .unwrap();
        assert_eq!(viewer.pick(at, &mut target).unwrap(), None);

        let _ = viewer.execute(ViewerCommand::ShowAll).unwrap();
        let _ = viewer.execute(ViewerCommand::ResetColors { ids: None }).unwrap();
        assert_eq!(viewer.pick(at, &mut target).unwrap().unwrap().id, "front");
    }

    #[test]
    fn pick_identifies_model_and_part() {
        let mut viewer = viewer(Options::default());
        let _ = viewer.open_model(quad_source("A", &[("a1", -3.0)]));
        let b = viewer.open_model(quad_source("B", &[("b1", 3.0)]));
        let _ = viewer.finish_loads().unwrap();
        let mut target = SoftwarePickTarget::default();

        let hit = viewer.pick(pointer_at(&viewer, 3.0), &mut target).unwrap().unwrap();
        assert_eq!(hit.model, b);
        assert_eq!(hit.id, "b1");
        assert_eq!(viewer.parts_of(b), &[hit.part]);
    }

    #[test]
    fn stats_and_bounds_track_loads() {
        let mut viewer = viewer(Options::default());
        let a = viewer.open_model(quad_source("A", &[("a1", -3.0), ("a2", 0.0)]));
        assert_eq!(viewer.stats().pending_loads, 1);
        let _ = viewer.finish_loads().unwrap();

        let stats = viewer.stats();
        assert_eq!(stats.models, 1);
        assert_eq!(stats.parts, 2);
        assert_eq!(stats.vertices, 8);
        assert_eq!(stats.indices, 12);
        assert_eq!(stats.live_pick_colors, 2);
        assert_eq!(viewer.models()[0].id, a);

        let bounds = viewer.scene_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-3.5, -0.3, 0.0));
        assert_eq!(bounds.max, Vec3::new(0.7, 0.5, 0.0));
        assert!(viewer.resolve(&["a1", "zz"]).missing == ["zz"]);
    }
}
