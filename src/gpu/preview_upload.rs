//! GPU mirror of the [`FastPreview`] proxies, drawn in place of the merged
//! batches while the camera moves.

use crate::camera::Camera;
use crate::error::StrataError;
use crate::gpu::dynamic_buffer::DynamicBuffer;
use crate::gpu::merged_upload::UploadStats;
use crate::gpu::pipeline_helpers::{self, CameraBinding};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, MERGED_MESH_WGSL};
use crate::preview::FastPreview;
use crate::scene::{Appearance, ModelId};

/// Every proxy concatenated into one flat-colored mesh.
#[derive(Debug, Default)]
struct PreviewMesh {
    positions: Vec<[f32; 3]>,
    colors: Vec<[u8; 4]>,
    indices: Vec<u32>,
}

impl PreviewMesh {
    fn build(preview: &FastPreview, rgba: [u8; 4]) -> Self {
        let mut mesh = Self::default();
        for (_, proxy) in preview.proxies() {
            let base = mesh.positions.len() as u32;
            let geometry = &proxy.geometry;
            mesh.positions
                .extend(geometry.positions.iter().map(|p| p.to_array()));
            mesh.colors
                .extend(std::iter::repeat_n(rgba, geometry.positions.len()));
            mesh.indices
                .extend(geometry.indices.iter().map(|&i| i + base));
        }
        mesh
    }
}

/// Models in a stable order, for detecting open/close between syncs.
fn model_set(preview: &FastPreview) -> Vec<ModelId> {
    let mut models: Vec<ModelId> = preview.proxies().map(|(id, _)| id).collect();
    models.sort_unstable();
    models
}

/// Proxy buffers plus the pipeline drawing them.
///
/// Proxies only change when models open or close, so the whole mesh is
/// re-uploaded on those events and left alone otherwise.
pub struct GpuPreviewScene {
    positions: DynamicBuffer,
    colors: DynamicBuffer,
    indices: DynamicBuffer,
    index_count: u32,
    uploaded: Option<Vec<ModelId>>,
    color: [u8; 4],
    pipeline: wgpu::RenderPipeline,
    camera: CameraBinding,
}

impl GpuPreviewScene {
    /// Create the proxy pipeline targeting `context.format`, drawing every
    /// proxy in `color`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Shader`] if the mesh shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        color: Appearance,
    ) -> Result<Self, StrataError> {
        let device = &context.device;
        let shader =
            composer.compose(device, "Preview Proxy Shader", MERGED_MESH_WGSL)?;
        let camera = CameraBinding::new(device, "Preview Proxy");
        let pipeline = pipeline_helpers::create_mesh_pipeline(
            device,
            "Preview Proxy",
            &shader,
            context.format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            &[&camera.layout],
        );
        Ok(Self {
            positions: DynamicBuffer::new(
                device,
                "Preview Positions",
                0,
                wgpu::BufferUsages::VERTEX,
            ),
            colors: DynamicBuffer::new(
                device,
                "Preview Colors",
                0,
                wgpu::BufferUsages::VERTEX,
            ),
            indices: DynamicBuffer::new(
                device,
                "Preview Indices",
                0,
                wgpu::BufferUsages::INDEX,
            ),
            index_count: 0,
            uploaded: None,
            color: color.to_rgba(),
            pipeline,
            camera,
        })
    }

    /// Re-upload the proxies if models opened or closed since the last sync.
    pub fn sync(&mut self, context: &RenderContext, preview: &FastPreview) -> UploadStats {
        let mut stats = UploadStats::default();
        let models = model_set(preview);
        if self.uploaded.as_ref() == Some(&models) {
            return stats;
        }
        let mesh = PreviewMesh::build(preview, self.color);
        let (device, queue) = (&context.device, &context.queue);
        let _ = self.positions.write(device, queue, &mesh.positions);
        let _ = self.colors.write(device, queue, &mesh.colors);
        let _ = self.indices.write(device, queue, &mesh.indices);
        self.index_count = mesh.indices.len() as u32;
        stats.full_uploads = 1;
        stats.bytes = self.positions.len() + self.colors.len() + self.indices.len();
        log::debug!(
            "preview sync: {} proxies, {} indices",
            models.len(),
            self.index_count
        );
        self.uploaded = Some(models);
        stats
    }

    /// Upload the camera used by [`Self::draw`].
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera) {
        self.camera.update(queue, camera);
    }

    /// Record the proxy draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera.bind_group, &[]);
        pass.set_vertex_buffer(0, self.positions.buffer().slice(..));
        pass.set_vertex_buffer(1, self.colors.buffer().slice(..));
        pass.set_index_buffer(self.indices.buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Number of indices drawn.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::options::{PreviewOptions, PreviewStrategy};
    use crate::preview::PreviewProxy;

    fn proxy(offset: f32) -> PreviewProxy {
        let points = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z].map(|p| p + offset);
        PreviewProxy::build(PreviewStrategy::AxisAlignedBox, &points).unwrap()
    }

    #[test]
    fn mesh_concatenates_proxies_in_one_color() {
        let mut preview = FastPreview::new(PreviewOptions::default());
        preview.insert(ModelId::new(1), proxy(0.0));
        preview.insert(ModelId::new(2), proxy(5.0));

        let gray = [150, 150, 160, 255];
        let mesh = PreviewMesh::build(&preview, gray);
        assert_eq!(mesh.positions.len(), 16);
        assert_eq!(mesh.indices.len(), 72);
        assert!(mesh.colors.iter().all(|c| *c == gray));
        assert!(mesh.indices[36..].iter().all(|&i| (8..16).contains(&i)));
    }

    #[test]
    fn model_set_ignores_insertion_order() {
        let mut forward = FastPreview::new(PreviewOptions::default());
        forward.insert(ModelId::new(1), proxy(0.0));
        forward.insert(ModelId::new(2), proxy(1.0));
        let mut backward = FastPreview::new(PreviewOptions::default());
        backward.insert(ModelId::new(2), proxy(1.0));
        backward.insert(ModelId::new(1), proxy(0.0));
        assert_eq!(model_set(&forward), model_set(&backward));

        let _ = backward.remove(ModelId::new(2));
        assert_ne!(model_set(&forward), model_set(&backward));
    }
}
