use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How parts are grouped into merged draw buffers.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// One buffer for the whole scene.
    Scene,
    /// One buffer per model.
    PerModel,
    /// Per model, split into further buffers once the vertex cap is hit.
    #[default]
    PerModelCapped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Merge", inline)]
#[serde(default)]
/// Merged-geometry batching parameters.
pub struct MergeOptions {
    /// Batch granularity.
    #[schemars(title = "Strategy")]
    pub strategy: MergeStrategy,
    /// Vertex cap per batch for [`MergeStrategy::PerModelCapped`]. The
    /// default keeps every batch addressable with 16-bit indices.
    #[schemars(title = "Vertex Cap", range(min = 1024))]
    pub vertex_cap: u32,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::PerModelCapped,
            vertex_cap: 65_536,
        }
    }
}
