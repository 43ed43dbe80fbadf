//! GPU mirror of [`MergedGeometry`].
//!
//! New batches are uploaded whole. After that only the color ranges
//! reported dirty by a patch are written; positions and indices stay put.

use slotmap::SecondaryMap;

use crate::camera::Camera;
use crate::error::StrataError;
use crate::gpu::dynamic_buffer::DynamicBuffer;
use crate::gpu::pipeline_helpers::{self, CameraBinding};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, MERGED_MESH_WGSL};
use crate::merge::{BatchKey, MergedBatch, MergedGeometry};

/// Byte traffic of one [`GpuMergedScene::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Batches uploaded whole.
    pub full_uploads: usize,
    /// Dirty color ranges written.
    pub color_ranges: usize,
    /// Total bytes handed to the queue.
    pub bytes: usize,
}

/// Vertex and index buffers of one merged batch.
pub struct GpuMergedBatch {
    positions: DynamicBuffer,
    colors: DynamicBuffer,
    indices: DynamicBuffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
}

/// 16-bit copy of `indices`, or `None` when the batch needs 32 bits.
fn narrow_indices(batch: &MergedBatch) -> Option<Vec<u16>> {
    if batch.needs_wide_indices() {
        return None;
    }
    Some(batch.indices().iter().map(|&i| i as u16).collect())
}

impl GpuMergedBatch {
    fn upload(
        device: &wgpu::Device,
        batch: &MergedBatch,
        stats: &mut UploadStats,
    ) -> Self {
        let positions = DynamicBuffer::new_with_data(
            device,
            "Merged Positions",
            batch.positions(),
            wgpu::BufferUsages::VERTEX,
        );
        let colors = DynamicBuffer::new_with_data(
            device,
            "Merged Colors",
            batch.colors(),
            wgpu::BufferUsages::VERTEX,
        );
        let (indices, index_format) = match narrow_indices(batch) {
            Some(narrow) => (
                DynamicBuffer::new_with_data(
                    device,
                    "Merged Indices",
                    &narrow,
                    wgpu::BufferUsages::INDEX,
                ),
                wgpu::IndexFormat::Uint16,
            ),
            None => (
                DynamicBuffer::new_with_data(
                    device,
                    "Merged Indices",
                    batch.indices(),
                    wgpu::BufferUsages::INDEX,
                ),
                wgpu::IndexFormat::Uint32,
            ),
        };
        stats.full_uploads += 1;
        stats.bytes += positions.len() + colors.len() + indices.len();
        Self {
            positions,
            colors,
            indices,
            index_format,
            index_count: batch.index_count() as u32,
        }
    }

    fn patch_colors(
        &self,
        queue: &wgpu::Queue,
        batch: &mut MergedBatch,
        stats: &mut UploadStats,
    ) {
        for range in batch.take_dirty_ranges() {
            let vertices = range.start as usize..range.end as usize;
            let Some(colors) = batch.colors().get(vertices) else {
                log::warn!("dirty range {range:?} outside batch colors");
                continue;
            };
            let offset = range.start as usize * size_of::<[u8; 4]>();
            if self.colors.write_at(queue, offset, colors) {
                stats.color_ranges += 1;
                stats.bytes += size_of_val(colors);
            }
        }
    }

    /// Index format chosen at upload.
    pub fn index_format(&self) -> wgpu::IndexFormat {
        self.index_format
    }

    /// Number of indices drawn.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.positions.buffer().slice(..));
        pass.set_vertex_buffer(1, self.colors.buffer().slice(..));
        pass.set_index_buffer(self.indices.buffer().slice(..), self.index_format);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// GPU buffers for every merged batch plus the pipeline drawing them.
pub struct GpuMergedScene {
    batches: SecondaryMap<BatchKey, GpuMergedBatch>,
    order: Vec<BatchKey>,
    pipeline: wgpu::RenderPipeline,
    camera: CameraBinding,
}

impl GpuMergedScene {
    /// Create the merged-mesh pipeline targeting `context.format`.
    ///
    /// Colors are alpha-blended so faded parts stay translucent; fully
    /// transparent fragments are discarded in the shader.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Shader`] if the mesh shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
    ) -> Result<Self, StrataError> {
        let device = &context.device;
        let shader =
            composer.compose(device, "Merged Mesh Shader", MERGED_MESH_WGSL)?;
        let camera = CameraBinding::new(device, "Merged Mesh");
        let pipeline = pipeline_helpers::create_mesh_pipeline(
            device,
            "Merged Mesh",
            &shader,
            context.format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            &[&camera.layout],
        );
        Ok(Self {
            batches: SecondaryMap::new(),
            order: Vec::new(),
            pipeline,
            camera,
        })
    }

    /// Bring the GPU buffers in line with `merged`: drop buffers of vanished
    /// batches, upload new ones whole, write dirty color ranges of the rest.
    pub fn sync(
        &mut self,
        context: &RenderContext,
        merged: &mut MergedGeometry,
    ) -> UploadStats {
        let mut stats = UploadStats::default();
        let keys = merged.batch_keys().to_vec();
        self.batches.retain(|key, _| keys.contains(&key));

        for &key in &keys {
            let Some(batch) = merged.batch_mut(key) else {
                continue;
            };
            if batch.take_full_upload() || !self.batches.contains_key(key) {
                let gpu = GpuMergedBatch::upload(&context.device, batch, &mut stats);
                let _ = self.batches.insert(key, gpu);
            } else if let Some(gpu) = self.batches.get(key) {
                gpu.patch_colors(&context.queue, batch, &mut stats);
            }
        }
        self.order = keys;
        if stats.full_uploads > 0 || stats.color_ranges > 0 {
            log::debug!(
                "merged sync: {} full, {} color ranges, {} bytes",
                stats.full_uploads,
                stats.color_ranges,
                stats.bytes
            );
        }
        stats
    }

    /// Upload the camera used by [`Self::draw`].
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera) {
        self.camera.update(queue, camera);
    }

    /// Record draws for every batch in merge order.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera.bind_group, &[]);
        for &key in &self.order {
            if let Some(batch) = self.batches.get(key) {
                batch.draw(pass);
            }
        }
    }

    /// GPU batch for `key`.
    pub fn batch(&self, key: BatchKey) -> Option<&GpuMergedBatch> {
        self.batches.get(key)
    }

    /// Number of uploaded batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether nothing is uploaded.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::options::{MergeOptions, MergeStrategy};
    use crate::scene::{Appearance, Geometry, ModelId, NewPart, PartRegistry};

    #[test]
    fn small_batches_use_narrow_indices() {
        let mut registry = PartRegistry::new();
        let geometry = Geometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        );
        let model = ModelId::new(1);
        let _ = registry
            .insert_model(
                model,
                "guid".to_owned(),
                "m".to_owned(),
                vec![NewPart {
                    name: "p".to_owned(),
                    geometry: Arc::new(geometry),
                    base: Appearance::default(),
                }],
            )
            .unwrap();
        let mut merged = MergedGeometry::new(MergeOptions {
            strategy: MergeStrategy::Scene,
            ..MergeOptions::default()
        });
        merged.rebuild(&registry, |_, part| part.base);
        let batch = merged.batches().next().unwrap();
        assert_eq!(narrow_indices(batch), Some(vec![0, 1, 2]));
    }

    fn strip(vertices: u32) -> Geometry {
        Geometry::new(
            (0..vertices)
                .map(|i| Vec3::new(i as f32, (i % 2) as f32, 0.0))
                .collect(),
            (0..vertices - 2).flat_map(|i| [i, i + 1, i + 2]).collect(),
        )
    }

    #[test]
    fn oversized_batches_keep_wide_indices() {
        let mut registry = PartRegistry::new();
        let parts = ["p0", "p1"]
            .into_iter()
            .map(|name| NewPart {
                name: name.to_owned(),
                geometry: Arc::new(strip(40_000)),
                base: Appearance::default(),
            })
            .collect();
        let _ = registry
            .insert_model(ModelId::new(1), "guid".to_owned(), "m".to_owned(), parts)
            .unwrap();
        let mut merged = MergedGeometry::new(MergeOptions {
            strategy: MergeStrategy::PerModel,
            ..MergeOptions::default()
        });
        merged.rebuild(&registry, |_, part| part.base);

        assert_eq!(merged.batch_count(), 1);
        let batch = merged.batches().next().unwrap();
        assert_eq!(batch.vertex_count(), 80_000);
        assert!(batch.needs_wide_indices());
        assert_eq!(narrow_indices(batch), None);
        assert_eq!(batch.indices().iter().max(), Some(&79_999));
    }
}
