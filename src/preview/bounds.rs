//! Box proxies: axis-aligned and PCA-oriented.

use glam::{Mat3, Vec3};

use crate::scene::Geometry;

/// Triangle indices of a box whose corners follow [`box_corners`] order.
const BOX_INDICES: [u32; 36] = [
    0, 2, 1, 0, 3, 2, // -z
    4, 5, 6, 4, 6, 7, // +z
    0, 1, 5, 0, 5, 4, // -y
    3, 7, 6, 3, 6, 2, // +y
    0, 4, 7, 0, 7, 3, // -x
    1, 2, 6, 1, 6, 5, // +x
];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Tightest box around `points`, `None` for an empty set.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.min(*p),
            max: b.max.max(*p),
        }))
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Box center.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Closed triangle mesh of the box.
    #[must_use]
    pub fn to_mesh(&self) -> Geometry {
        OrientedBox::from(*self).to_mesh()
    }
}

/// Box with arbitrary orthonormal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Box center.
    pub center: Vec3,
    /// Orthonormal local axes.
    pub axes: [Vec3; 3],
    /// Half extent along each axis.
    pub half_extents: Vec3,
}

impl From<Aabb> for OrientedBox {
    fn from(aabb: Aabb) -> Self {
        Self {
            center: aabb.center(),
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half_extents: aabb.size() * 0.5,
        }
    }
}

impl OrientedBox {
    /// Fit a box along the principal axes of `points`.
    ///
    /// Principal axes only approximate the minimum-volume box, so the
    /// axis-aligned box is returned instead whenever it is smaller.
    #[must_use]
    pub fn fit(points: &[Vec3]) -> Option<Self> {
        let aabb = Aabb::from_points(points)?;
        let mean = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let mut covariance = [[0.0_f32; 3]; 3];
        for p in points {
            let d = (*p - mean).to_array();
            for (i, row) in covariance.iter_mut().enumerate() {
                for (j, c) in row.iter_mut().enumerate() {
                    *c += d[i] * d[j];
                }
            }
        }
        let axes = principal_axes(covariance);

        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            let local = Vec3::new(p.dot(axes[0]), p.dot(axes[1]), p.dot(axes[2]));
            lo = lo.min(local);
            hi = hi.max(local);
        }
        let mid = (lo + hi) * 0.5;
        let fitted = Self {
            center: axes[0] * mid.x + axes[1] * mid.y + axes[2] * mid.z,
            axes,
            half_extents: (hi - lo) * 0.5,
        };
        Some(if fitted.volume() < aabb.volume() {
            fitted
        } else {
            aabb.into()
        })
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        let e = self.half_extents * 2.0;
        e.x * e.y * e.z
    }

    /// The eight corners: the `-z` face counter-clockwise from the minimum
    /// corner, then the `+z` face in the same order.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        box_corners(self.half_extents).map(|c| {
            self.center + self.axes[0] * c.x + self.axes[1] * c.y + self.axes[2] * c.z
        })
    }

    /// Closed triangle mesh of the box.
    #[must_use]
    pub fn to_mesh(&self) -> Geometry {
        Geometry::new(self.corners().to_vec(), BOX_INDICES.to_vec())
    }
}

fn box_corners(h: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
    ]
}

/// Eigenvectors of a symmetric 3×3 matrix via cyclic Jacobi rotations,
/// returned as a right-handed orthonormal basis.
fn principal_axes(mut a: [[f32; 3]; 3]) -> [Vec3; 3] {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for _sweep in 0..32 {
        let off = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off <= f32::EPSILON {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q].abs() <= f32::MIN_POSITIVE {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            for k in 0..3 {
                let (akp, akq) = (a[k][p], a[k][q]);
                a[k][p] = c * akp - s * akq;
                a[k][q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let (apk, aqk) = (a[p][k], a[q][k]);
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in &mut v {
                let (vp, vq) = (row[p], row[q]);
                row[p] = c * vp - s * vq;
                row[q] = s * vp + c * vq;
            }
        }
    }
    let basis = Mat3::from_cols_array_2d(&v).transpose();
    let x = basis.x_axis.normalize_or(Vec3::X);
    let y = basis.y_axis.reject_from_normalized(x).normalize_or(x.any_orthonormal_vector());
    [x, y, x.cross(y)]
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;

    #[test]
    fn aabb_encloses_points() {
        let points = [Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 3.0, 0.0)];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
        assert_eq!(aabb.to_mesh().index_count(), 36);
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn oriented_box_beats_aabb_for_rotated_slab() {
        let rotation = Quat::from_rotation_z(0.6) * Quat::from_rotation_x(0.3);
        let mut points = Vec::new();
        for x in [-4.0, 4.0] {
            for y in [-1.0, 1.0] {
                for z in [-0.2, 0.2] {
                    points.push(rotation * Vec3::new(x, y, z));
                }
            }
        }
        let aabb = Aabb::from_points(&points).unwrap();
        let obb = OrientedBox::fit(&points).unwrap();
        assert!(obb.volume() < aabb.volume());
        assert!((obb.volume() - 8.0 * 2.0 * 0.4).abs() < 0.05);
        for p in &points {
            let d = *p - obb.center;
            for (axis, half) in obb.axes.iter().zip(obb.half_extents.to_array()) {
                assert!(d.dot(*axis).abs() <= half + 1e-3);
            }
        }
    }

    #[test]
    fn axes_are_orthonormal() {
        let axes = principal_axes([[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]]);
        for (i, a) in axes.iter().enumerate() {
            assert!((a.length() - 1.0).abs() < 1e-4);
            for b in &axes[i + 1..] {
                assert!(a.dot(*b).abs() < 1e-4);
            }
        }
    }
}
