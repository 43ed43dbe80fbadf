//! Cheap per-model bounding proxies drawn while the camera moves.
//!
//! Proxies are computed once per model on the loader thread. They never take
//! part in picking.

mod bounds;
mod hull;
mod motion;

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

pub use bounds::{Aabb, OrientedBox};
pub use hull::{convex_hull, HullFailure, MAX_HULL_FACES};
pub use motion::{FrameMode, MotionTracker};

use crate::options::{PreviewOptions, PreviewStrategy};
use crate::scene::{Geometry, ModelId};

/// Bounding proxy of one model.
#[derive(Debug, Clone)]
pub struct PreviewProxy {
    /// Strategy that actually produced `geometry` (a degenerate hull falls
    /// back to the axis-aligned box).
    pub strategy: PreviewStrategy,
    /// Closed proxy mesh in world space.
    pub geometry: Geometry,
    /// Axis-aligned bounds of the model.
    pub bounds: Aabb,
}

impl PreviewProxy {
    /// Build a proxy around `points`. `None` for an empty model.
    #[must_use]
    pub fn build(strategy: PreviewStrategy, points: &[Vec3]) -> Option<Self> {
        let bounds = Aabb::from_points(points)?;
        let (strategy, geometry) = match strategy {
            PreviewStrategy::ConvexHull => match convex_hull(points) {
                Ok(hull) => (strategy, hull),
                Err(HullFailure::Degenerate) => {
                    (PreviewStrategy::AxisAlignedBox, bounds.to_mesh())
                }
                Err(HullFailure::TooManyFaces) => {
                    log::debug!("hull over {MAX_HULL_FACES} faces, using an oriented box");
                    (PreviewStrategy::OrientedBox, oriented(points, bounds))
                }
            },
            PreviewStrategy::OrientedBox => (strategy, oriented(points, bounds)),
            PreviewStrategy::AxisAlignedBox => (strategy, bounds.to_mesh()),
        };
        Some(Self {
            strategy,
            geometry,
            bounds,
        })
    }
}

fn oriented(points: &[Vec3], bounds: Aabb) -> Geometry {
    OrientedBox::fit(points)
        .unwrap_or_else(|| bounds.into())
        .to_mesh()
}

/// Proxies of every loaded model plus the motion state choosing between
/// them and the merged buffers.
#[derive(Debug)]
pub struct FastPreview {
    options: PreviewOptions,
    proxies: FxHashMap<ModelId, PreviewProxy>,
    motion: MotionTracker,
}

impl FastPreview {
    /// Empty preview set.
    #[must_use]
    pub fn new(options: PreviewOptions) -> Self {
        Self {
            motion: MotionTracker::new(options.motion_frames),
            options,
            proxies: FxHashMap::default(),
        }
    }

    /// Strategy proxies are built with.
    #[must_use]
    pub fn strategy(&self) -> PreviewStrategy {
        self.options.strategy
    }

    /// Store the proxy of a freshly opened model.
    pub fn insert(&mut self, model: ModelId, proxy: PreviewProxy) {
        let _ = self.proxies.insert(model, proxy);
    }

    /// Drop the proxy of a closed model.
    pub fn remove(&mut self, model: ModelId) -> Option<PreviewProxy> {
        self.proxies.remove(&model)
    }

    /// Proxy of `model`.
    #[must_use]
    pub fn get(&self, model: ModelId) -> Option<&PreviewProxy> {
        self.proxies.get(&model)
    }

    /// All proxies, drawn together in place of the merged buffers.
    pub fn proxies(&self) -> impl Iterator<Item = (ModelId, &PreviewProxy)> {
        self.proxies.iter().map(|(id, p)| (*id, p))
    }

    /// Union of every model's bounds.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.proxies
            .values()
            .map(|p| p.bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Draw mode for a frame seen through `view_proj`.
    pub fn frame(&mut self, view_proj: Mat4) -> FrameMode {
        let mode = self.motion.observe(view_proj);
        if !self.options.enabled || self.proxies.is_empty() {
            return match mode {
                FrameMode::Preview => FrameMode::Detail { forced: false },
                detail => detail,
            };
        }
        mode
    }
}
