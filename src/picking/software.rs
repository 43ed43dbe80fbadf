//! CPU rasterizer for 1×1 pick passes, used to test picking without a GPU.

use glam::{Vec2, Vec3};

use super::target::{PickPass, PickTarget};
use crate::error::StrataError;

/// Rasterizes the pixel at NDC `(0, 0)` with a `[0, 1]` depth test.
///
/// Triangles with a vertex behind the eye are skipped instead of clipped.
#[derive(Debug, Default)]
pub(crate) struct SoftwarePickTarget {
    pub(crate) passes: usize,
}

impl PickTarget for SoftwarePickTarget {
    fn render_pixel(&mut self, pass: &PickPass<'_>) -> Result<[u8; 4], StrataError> {
        self.passes += 1;
        let mut nearest = f32::INFINITY;
        let mut texel = [0; 4];
        for proxy in pass.scene.visible_proxies() {
            for triangle in proxy.geometry.triangles() {
                let Some(ndc) = to_ndc(pass, triangle) else {
                    continue;
                };
                let Some(depth) = depth_at_origin(ndc) else {
                    continue;
                };
                if (0.0..=1.0).contains(&depth) && depth < nearest {
                    nearest = depth;
                    texel = proxy.color.to_rgba();
                }
            }
        }
        Ok(texel)
    }
}

fn to_ndc(pass: &PickPass<'_>, triangle: [Vec3; 3]) -> Option<[Vec3; 3]> {
    let mut out = [Vec3::ZERO; 3];
    for (dst, p) in out.iter_mut().zip(triangle) {
        let clip = pass.view_proj * p.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        *dst = clip.truncate() / clip.w;
    }
    Some(out)
}

/// Depth of the triangle at the origin, or `None` when the origin lies
/// outside it.
fn depth_at_origin([a, b, c]: [Vec3; 3]) -> Option<f32> {
    let edge = |p: Vec2, q: Vec2| p.perp_dot(q);
    let (a2, b2, c2) = (a.truncate(), b.truncate(), c.truncate());
    let area = (b2 - a2).perp_dot(c2 - a2);
    if area.abs() <= f32::EPSILON {
        return None;
    }
    // Barycentric weights of the origin.
    let wa = edge(b2, c2) / area;
    let wb = edge(c2, a2) / area;
    let wc = edge(a2, b2) / area;
    if wa < 0.0 || wb < 0.0 || wc < 0.0 {
        return None;
    }
    Some(wa * a.z + wb * b.z + wc * c.z)
}
