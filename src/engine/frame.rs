//! Per-frame camera and draw-mode handling.

use super::Viewer;
use crate::camera::Camera;
use crate::gpu::merged_upload::{GpuMergedScene, UploadStats};
use crate::gpu::preview_upload::GpuPreviewScene;
use crate::gpu::render_context::RenderContext;
use crate::preview::FrameMode;

impl Viewer {
    /// Replace the camera used for picking and frame decisions.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Current camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Resize the viewport in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.viewport = (width.max(1), height.max(1));
    }

    /// Decide what to draw this frame.
    ///
    /// While the camera keeps moving the per-model preview proxies replace
    /// the merged buffers; the first still frame switches back and reports
    /// a forced full-detail redraw.
    pub fn frame(&mut self) -> FrameMode {
        self.preview.frame(self.camera.build_matrix())
    }

    /// Push pending merged-geometry changes and the camera to the GPU.
    ///
    /// Only new batches are uploaded whole; patched parts cost one color
    /// write per dirty range.
    pub fn sync_gpu(
        &mut self,
        context: &RenderContext,
        scene: &mut GpuMergedScene,
    ) -> UploadStats {
        scene.update_camera(&context.queue, &self.camera);
        scene.sync(context, &mut self.merged)
    }

    /// Push the preview proxies and the camera to the GPU. Draw the result
    /// in place of the merged scene while [`Self::frame`] returns
    /// [`FrameMode::Preview`].
    pub fn sync_preview_gpu(
        &self,
        context: &RenderContext,
        scene: &mut GpuPreviewScene,
    ) -> UploadStats {
        scene.update_camera(&context.queue, &self.camera);
        scene.sync(context, &self.preview)
    }
}
