//! Incremental 3D convex hull.

use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;

use super::bounds::Aabb;
use crate::scene::Geometry;

#[derive(Debug, Clone, Copy)]
struct Face {
    v: [usize; 3],
    normal: Vec3,
    offset: f32,
    alive: bool,
}

impl Face {
    /// Face through `v`, wound so `interior` lies behind it.
    fn new(points: &[Vec3], v: [usize; 3], interior: Vec3) -> Self {
        let face = Self::wound(points, v);
        if face.distance(interior) > 0.0 {
            Self::wound(points, [v[0], v[2], v[1]])
        } else {
            face
        }
    }

    fn wound(points: &[Vec3], v: [usize; 3]) -> Self {
        let [a, b, c] = v.map(|i| points[i]);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            v,
            normal,
            offset: normal.dot(a),
            alive: true,
        }
    }

    fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

/// Hulls needing more faces than this are abandoned.
pub const MAX_HULL_FACES: usize = 512;

/// Point sets larger than this are reduced to a grid before hulling.
const REDUCE_ABOVE: usize = 4096;

/// Grid resolution along the largest extent.
const GRID_CELLS: f32 = 32.0;

/// Why no hull was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullFailure {
    /// Fewer than four points, or all of them coplanar.
    Degenerate,
    /// The hull would exceed [`MAX_HULL_FACES`].
    TooManyFaces,
}

/// Convex hull of `points` as a closed, outward-wound triangle mesh.
///
/// Large point sets are first replaced by the corners of the grid cells they
/// occupy, so the result always encloses the input and may sit up to one
/// cell outside it.
///
/// # Errors
///
/// [`HullFailure::Degenerate`] for coplanar input, which leaves the caller to
/// fall back to a box; [`HullFailure::TooManyFaces`] when the hull would be
/// too detailed to serve as a cheap proxy.
pub fn convex_hull(points: &[Vec3]) -> Result<Geometry, HullFailure> {
    if points.len() <= REDUCE_ABOVE {
        return hull_of(points, tolerance(points));
    }
    // Grid corners of a flat set are not coplanar.
    let _ = initial_simplex(points, tolerance(points)).ok_or(HullFailure::Degenerate)?;
    let reduced = grid_corners(points);
    hull_of(&reduced, tolerance(&reduced))
}

fn tolerance(points: &[Vec3]) -> f32 {
    let scale = points
        .iter()
        .fold(0.0_f32, |m, p| m.max(p.abs().max_element()))
        .max(1.0);
    scale * 1e-5
}

fn hull_of(points: &[Vec3], eps: f32) -> Result<Geometry, HullFailure> {
    let seed = initial_simplex(points, eps).ok_or(HullFailure::Degenerate)?;
    let interior = seed.iter().map(|&i| points[i]).sum::<Vec3>() * 0.25;

    let [a, b, c, d] = seed;
    let mut faces = vec![
        Face::new(points, [a, b, c], interior),
        Face::new(points, [a, b, d], interior),
        Face::new(points, [a, c, d], interior),
        Face::new(points, [b, c, d], interior),
    ];
    let mut dead = 0;

    for (i, &p) in points.iter().enumerate() {
        if seed.contains(&i) {
            continue;
        }
        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.distance(p) > eps)
            .map(|(n, _)| n)
            .collect();
        if visible.is_empty() {
            continue;
        }
        let mut edges = FxHashSet::default();
        for &n in &visible {
            faces[n].alive = false;
            edges.extend(faces[n].edges());
        }
        dead += visible.len();
        // An edge is on the horizon when its twin belongs to a face that
        // stays.
        let horizon: Vec<(usize, usize)> = edges
            .iter()
            .filter(|(u, v)| !edges.contains(&(*v, *u)))
            .copied()
            .collect();
        for (u, v) in horizon {
            faces.push(Face::new(points, [u, v, i], interior));
        }

        let alive = faces.len() - dead;
        if alive > MAX_HULL_FACES {
            return Err(HullFailure::TooManyFaces);
        }
        if dead > alive {
            faces.retain(|f| f.alive);
            dead = 0;
        }
    }

    Ok(compact(points, faces.iter().filter(|f| f.alive)))
}

/// Corners of every grid cell holding at least one point, each corner once.
fn grid_corners(points: &[Vec3]) -> Vec<Vec3> {
    let Some(bounds) = Aabb::from_points(points) else {
        return Vec::new();
    };
    let cell = bounds.size().max_element() / GRID_CELLS;
    if cell <= 0.0 {
        return points.to_vec();
    }
    let mut corners: FxHashSet<IVec3> = FxHashSet::default();
    for p in points {
        let base = ((*p - bounds.min) / cell).floor().as_ivec3();
        for n in 0..8 {
            let _ = corners.insert(base + IVec3::new(n & 1, (n >> 1) & 1, (n >> 2) & 1));
        }
    }
    let mut corners: Vec<IVec3> = corners.into_iter().collect();
    corners.sort_unstable_by_key(|c| (c.x, c.y, c.z));
    corners
        .into_iter()
        .map(|c| bounds.min + c.as_vec3() * cell)
        .collect()
}

/// Four affinely independent points spanning the set.
fn initial_simplex(points: &[Vec3], eps: f32) -> Option<[usize; 4]> {
    let farthest = |score: &dyn Fn(Vec3) -> f32| {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, score(*p)))
            .max_by(|x, y| x.1.total_cmp(&y.1))
    };
    let (a, _) = farthest(&|p: Vec3| -p.x)?;
    let pa = points[a];
    let (b, dist) = farthest(&|p: Vec3| p.distance_squared(pa))?;
    if dist.sqrt() <= eps {
        return None;
    }
    let ab = (points[b] - pa).normalize();
    let (c, dist) = farthest(&|p: Vec3| (p - pa).reject_from_normalized(ab).length())?;
    if dist <= eps {
        return None;
    }
    let normal = ab.cross(points[c] - pa).normalize();
    let (d, dist) = farthest(&|p: Vec3| (p - pa).dot(normal).abs())?;
    if dist <= eps {
        return None;
    }
    Some([a, b, c, d])
}

/// Mesh over only the vertices the faces reference.
fn compact<'a>(points: &[Vec3], faces: impl Iterator<Item = &'a Face>) -> Geometry {
    let mut remap = vec![u32::MAX; points.len()];
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for face in faces {
        for v in face.v {
            if remap[v] == u32::MAX {
                remap[v] = positions.len() as u32;
                positions.push(points[v]);
            }
            indices.push(remap[v]);
        }
    }
    Geometry::new(positions, indices)
}
