use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::Appearance;

/// Shape of the cheap per-model proxy drawn during camera motion.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStrategy {
    /// Convex hull of every vertex.
    ConvexHull,
    /// World axis-aligned bounding box.
    #[default]
    AxisAlignedBox,
    /// Smallest box found along the principal axes.
    OrientedBox,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Preview", inline)]
#[serde(default)]
/// Fast-preview parameters.
pub struct PreviewOptions {
    /// Whether proxies replace detail during camera motion.
    #[schemars(title = "Enabled")]
    pub enabled: bool,
    /// Proxy shape, computed once per model at load time.
    #[schemars(title = "Strategy")]
    pub strategy: PreviewStrategy,
    /// Consecutive moving frames before the preview engages.
    #[schemars(title = "Motion Frames", range(min = 1, max = 30))]
    pub motion_frames: u32,
    /// Flat color the proxies are drawn in.
    #[schemars(title = "Color")]
    pub color: Appearance,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: PreviewStrategy::AxisAlignedBox,
            motion_frames: 1,
            color: Appearance::opaque([150, 150, 160]),
        }
    }
}
