use glam::{Mat4, Vec2, Vec3, Vec4};

/// Perspective camera defined by eye position, target, projection
/// parameters and the pixel size of the viewport it renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Viewport size in pixels.
    pub viewport: (u32, u32),
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Viewport aspect ratio.
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45.0,
            znear: 0.1,
            zfar: 1000.0,
            viewport: (1280, 720),
        }
    }
}

impl Camera {
    /// Viewport aspect ratio (width / height).
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32
    }

    /// Build the view matrix.
    #[must_use]
    pub fn build_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Build the full-viewport projection matrix.
    #[must_use]
    pub fn build_projection(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect(),
            self.znear,
            self.zfar,
        )
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.build_projection() * self.build_view()
    }

    /// Projection narrowed to a 1×1 pixel window centered on `(x, y)`.
    ///
    /// `(x, y)` are pixel coordinates with the origin at the top-left of the
    /// viewport. The returned frustum is the sub-window of the full one, so
    /// rendering through it into a 1×1 target yields exactly the texel a
    /// full-resolution render would have at that position.
    #[must_use]
    pub fn view_offset_projection(&self, x: f32, y: f32) -> Mat4 {
        let (width, height) = (
            self.viewport.0.max(1) as f32,
            self.viewport.1.max(1) as f32,
        );
        let top = self.znear * (self.fovy.to_radians() * 0.5).tan();
        let full_height = 2.0 * top;
        let full_width = full_height * self.aspect();

        let pixel_w = full_width / width;
        let pixel_h = full_height / height;
        let left = -0.5 * full_width + (x - 0.5) * pixel_w;
        let top = top - (y - 0.5) * pixel_h;

        off_center_perspective(
            left,
            left + pixel_w,
            top - pixel_h,
            top,
            self.znear,
            self.zfar,
        )
    }

    /// View-projection for a 1×1 pick at pixel `(x, y)`.
    #[must_use]
    pub fn pick_matrix(&self, x: f32, y: f32) -> Mat4 {
        self.view_offset_projection(x, y) * self.build_view()
    }

    /// Project a world point to pixel coordinates (top-left origin). Points
    /// behind the eye yield `None`.
    #[must_use]
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.build_matrix() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.viewport.0 as f32,
            (0.5 - ndc.y * 0.5) * self.viewport.1 as f32,
        ))
    }
}

/// Right-handed off-center perspective with a [0,1] depth range.
fn off_center_perspective(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            far / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, near * far / depth, 0.0),
    )
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.6,
        }
    }

    /// Uniform for an explicit view-projection (e.g. a pick matrix).
    #[must_use]
    pub fn from_matrix(view_proj: Mat4, camera: &Camera) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: camera.eye.to_array(),
            aspect: camera.aspect(),
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        *self = Self::from_matrix(camera.build_matrix(), camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn centered_window_matches_full_projection_center() {
        let camera = Camera {
            viewport: (200, 100),
            ..Camera::default()
        };
        // Window centered on the viewport center is a plain narrowing.
        let full = ndc(camera.build_matrix(), Vec3::new(0.0, 0.0, 0.0));
        let narrow = ndc(camera.pick_matrix(100.0, 50.0), Vec3::ZERO);
        assert!(full.truncate().length() < 1e-5);
        assert!(narrow.truncate().length() < 1e-3);
        assert!((full.z - narrow.z).abs() < 1e-5);
    }

    #[test]
    fn projected_point_lands_at_window_center() {
        let camera = Camera {
            eye: Vec3::new(3.0, 4.0, 12.0),
            viewport: (640, 480),
            ..Camera::default()
        };
        let world = Vec3::new(1.5, -0.75, 0.5);
        let pixel = camera.project(world).unwrap();
        let offset = ndc(camera.pick_matrix(pixel.x, pixel.y), world);
        assert!(offset.x.abs() < 1e-2, "x = {}", offset.x);
        assert!(offset.y.abs() < 1e-2, "y = {}", offset.y);
    }

    #[test]
    fn neighbouring_pixel_falls_outside_window() {
        let camera = Camera::default();
        let pixel = camera.project(Vec3::ZERO).unwrap();
        let offset = ndc(camera.pick_matrix(pixel.x + 3.0, pixel.y), Vec3::ZERO);
        assert!(offset.x.abs() > 1.0);
    }
}
