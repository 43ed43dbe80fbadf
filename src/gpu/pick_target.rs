//! GPU implementation of [`PickTarget`]: renders the visible proxies into a
//! 1×1 offscreen texture and reads the texel back.

use std::sync::mpsc;

use crate::camera::CameraUniform;
use crate::error::StrataError;
use crate::gpu::dynamic_buffer::DynamicBuffer;
use crate::gpu::pipeline_helpers::{self, CameraBinding, DEPTH_FORMAT};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, PICKING_WGSL};
use crate::picking::{PickPass, PickTarget, PickingScene};

const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Concatenated, color-tagged geometry of every visible proxy.
#[derive(Debug, Default)]
struct ProxyMesh {
    positions: Vec<[f32; 3]>,
    colors: Vec<[u8; 4]>,
    indices: Vec<u32>,
}

impl ProxyMesh {
    fn build(scene: &PickingScene) -> Self {
        let mut mesh = Self::default();
        for proxy in scene.visible_proxies() {
            let base = mesh.positions.len() as u32;
            let rgba = proxy.color.to_rgba();
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

/// Offscreen 1×1 pick surface.
pub struct GpuPickTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    camera: CameraBinding,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    staging: wgpu::Buffer,
    positions: DynamicBuffer,
    colors: DynamicBuffer,
    indices: DynamicBuffer,
    index_count: u32,
    /// Proxy generation the buffers were built from.
    uploaded: Option<u64>,
}

impl GpuPickTarget {
    /// Create the pick pipeline and its 1×1 targets.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Shader`] if the picking shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
    ) -> Result<Self, StrataError> {
        let device = &context.device;
        let shader = composer.compose(device, "Picking Shader", PICKING_WGSL)?;
        let camera = CameraBinding::new(device, "Picking");
        let pipeline = pipeline_helpers::create_mesh_pipeline(
            device,
            "Picking",
            &shader,
            PICK_FORMAT,
            None,
            &[&camera.layout],
        );

        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Picking Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Picking Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Picking Staging"),
            size: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let color_view =
            color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view =
            depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            device: device.clone(),
            queue: context.queue.clone(),
            pipeline,
            camera,
            color_texture,
            color_view,
            depth_view,
            staging,
            positions: DynamicBuffer::new(
                device,
                "Picking Positions",
                0,
                wgpu::BufferUsages::VERTEX,
            ),
            colors: DynamicBuffer::new(
                device,
                "Picking Colors",
                0,
                wgpu::BufferUsages::VERTEX,
            ),
            indices: DynamicBuffer::new(
                device,
                "Picking Indices",
                0,
                wgpu::BufferUsages::INDEX,
            ),
            index_count: 0,
            uploaded: None,
        })
    }

    /// Re-upload proxies when the scene's proxy set changed.
    fn sync_proxies(&mut self, scene: &PickingScene) {
        let generation = scene.generation();
        if self.uploaded == Some(generation) {
            return;
        }
        let mesh = ProxyMesh::build(scene);
        let _ = self.positions.write(&self.device, &self.queue, &mesh.positions);
        let _ = self.colors.write(&self.device, &self.queue, &mesh.colors);
        let _ = self.indices.write(&self.device, &self.queue, &mesh.indices);
        self.index_count = mesh.indices.len() as u32;
        self.uploaded = Some(generation);
        log::debug!(
            "pick proxies uploaded: {} vertices, {} indices",
            mesh.positions.len(),
            self.index_count
        );
    }

    fn encode_pass(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Picking Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                },
            ),
            ..Default::default()
        });
        if self.index_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera.bind_group, &[]);
        pass.set_vertex_buffer(0, self.positions.buffer().slice(..));
        pass.set_vertex_buffer(1, self.colors.buffer().slice(..));
        pass.set_index_buffer(
            self.indices.buffer().slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn read_texel(&self) -> Result<[u8; 4], StrataError> {
        let slice = self.staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::Wait);
        rx.recv()
            .map_err(|e| StrataError::Readback(e.to_string()))?
            .map_err(|e| StrataError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&data[..4]);
        drop(data);
        self.staging.unmap();
        Ok(rgba)
    }
}

impl PickTarget for GpuPickTarget {
    fn render_pixel(
        &mut self,
        pass: &PickPass<'_>,
    ) -> Result<[u8; 4], StrataError> {
        self.sync_proxies(pass.scene);
        self.camera.write(
            &self.queue,
            CameraUniform {
                view_proj: pass.view_proj.to_cols_array_2d(),
                position: [0.0; 3],
                aspect: 1.0,
            },
        );

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Picking Encoder"),
                });
        self.encode_pass(&mut encoder);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
        self.read_texel()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use slotmap::SlotMap;

    use super::*;
    use crate::scene::{Geometry, PartKey};

    fn triangle(x: f32) -> Arc<Geometry> {
        Arc::new(Geometry::new(
            vec![
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 1.0, 0.0, 0.0),
                Vec3::new(x, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        ))
    }

    #[test]
    fn proxy_mesh_skips_hidden_and_offsets_indices() {
        let mut arena: SlotMap<PartKey, ()> = SlotMap::with_key();
        let (a, b, c) = (arena.insert(()), arena.insert(()), arena.insert(()));
        let mut scene = PickingScene::new();
        let _ = scene.register(a, triangle(0.0), true).unwrap();
        let _ = scene.register(b, triangle(2.0), false).unwrap();
        let _ = scene.register(c, triangle(4.0), true).unwrap();

        let mesh = ProxyMesh::build(&scene);
        assert_eq!(mesh.positions.len(), 6);
        assert_eq!(mesh.colors.len(), 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < 6));
        let tags: Vec<_> = [a, c]
            .iter()
            .map(|&k| scene.color_of(k).unwrap().to_rgba())
            .collect();
        assert!(mesh.colors.iter().all(|rgba| tags.contains(rgba)));
        assert!(!mesh
            .colors
            .contains(&scene.color_of(b).unwrap().to_rgba()));
    }
}
