//! Chart extraction (spec C7).
//!
//! A chart is a connected group of triangles assigned to the same camera,
//! plus one special "unseen" chart collecting every triangle every camera
//! rated zero (spec §4.5). This module turns a shaped, smoothed
//! [`RatingMatrix`] into a list of [`Chart`]s, each carrying a 2D
//! embedding of its triangles in its own local frame — not yet placed in
//! an atlas, that's [`crate::pack`]'s job.

use std::collections::{HashSet, VecDeque};

use crate::camera::Camera;
use crate::geometry;
use crate::math::Vec2;
use crate::mesh::{Mesh, Triangle};
use crate::rating::RatingMatrix;

/// One connected group of triangles sharing an assigned camera (or `None`
/// for the unseen chart).
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub camera: Option<usize>,
    pub triangles: Vec<u32>,
    /// Local-frame 2D corner positions, indexed the same as `triangles`:
    /// `uv[i]` are the three corners of `triangles[i]`.
    pub uv: Vec<[Vec2; 3]>,
}

impl Chart {
    /// Axis-aligned bounding box of this chart's local-frame embedding.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for tri in &self.uv {
            for corner in tri {
                min.x = min.x.min(corner.x);
                min.y = min.y.min(corner.y);
                max.x = max.x.max(corner.x);
                max.y = max.y.max(corner.y);
            }
        }
        (min, max)
    }
}

/// Splits the mesh into charts, one per connected same-camera region plus
/// the unseen chart, using `adjacency` (spec §4.5).
///
/// Tie-breaking for "the" camera of a connected region never arises here:
/// [`RatingMatrix::best_camera`] already resolved each triangle's winner
/// deterministically (lowest index on ties) before this function runs.
pub fn build_charts(mesh: &Mesh, ratings: &RatingMatrix, adjacency: &[Vec<u32>], cameras: &[Camera]) -> Vec<Chart> {
    let triangle_count = mesh.triangle_count();
    let assignment: Vec<Option<usize>> = (0..triangle_count)
        .map(|t| {
            if ratings.is_unseen(t) {
                None
            } else {
                Some(ratings.best_camera(t).0)
            }
        })
        .collect();

    let mut visited = vec![false; triangle_count];
    let mut charts = Vec::new();

    for start in 0..triangle_count {
        if visited[start] {
            continue;
        }
        let group_camera = assignment[start];
        let mut group = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start as u32);
        visited[start] = true;

        while let Some(t) = queue.pop_front() {
            group.push(t);
            for &n in &adjacency[t as usize] {
                if !visited[n as usize] && assignment[n as usize] == group_camera {
                    visited[n as usize] = true;
                    queue.push_back(n);
                }
            }
        }

        group.sort_unstable();
        let uv = group
            .iter()
            .map(|&t| embed_triangle(mesh, t as usize, group_camera, cameras))
            .collect();
        charts.push(Chart {
            camera: group_camera,
            triangles: group,
            uv,
        });
    }

    charts
}

/// 2D-embeds one triangle. With a camera, this is its pixel-space
/// projection (so the chart's layout matches the photograph it samples
/// from); without one (the unseen chart), it's an arbitrary but
/// consistent planar frame built from the triangle's own normal.
fn embed_triangle(mesh: &Mesh, triangle: usize, camera: Option<usize>, cameras: &[Camera]) -> [Vec2; 3] {
    let positions = mesh.triangle_positions(triangle);
    if let Some(cam_idx) = camera {
        let cam = &cameras[cam_idx];
        let projected: Vec<Option<Vec2>> = positions.iter().map(|&p| cam.project(p).map(|(px, _)| px)).collect();
        if projected.iter().all(|p| p.is_some()) {
            return [projected[0].unwrap(), projected[1].unwrap(), projected[2].unwrap()];
        }
    }
    planar_embed(positions)
}

/// Projects a triangle onto its own plane using an orthonormal basis
/// derived from its normal, so degenerate-under-camera and unseen
/// triangles still get a sane, non-distorted local embedding.
fn planar_embed(positions: [crate::math::Vec3; 3]) -> [Vec2; 3] {
    let [a, b, c] = positions;
    let u = match (b - a).normalize_checked() {
        Some(u) => u,
        None => return [Vec2::ZERO, Vec2::ZERO, Vec2::ZERO],
    };
    let normal = geometry::triangle_normal(a, b, c).unwrap_or(u);
    let v = normal.cross(u);
    [
        Vec2::new(0.0, 0.0),
        Vec2::new((b - a).dot(u), (b - a).dot(v)),
        Vec2::new((c - a).dot(u), (c - a).dot(v)),
    ]
}

/// One level of midpoint subdivision: every triangle becomes four. Not
/// run by the pipeline automatically; a caller facing visible seams at
/// chart boundaries can apply this to the mesh before rating to give the
/// unwrapper finer-grained triangles to assign.
pub fn midpoint_subdivide(mesh: &Mesh) -> Result<Mesh, crate::mesh::MeshError> {
    use std::collections::HashMap;

    let mut vertices = mesh.vertices().to_vec();
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

    let mut midpoint_of = |vertices: &mut Vec<crate::math::Vec3>, a: u32, b: u32| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        *midpoints.entry(key).or_insert_with(|| {
            let mid = (vertices[a as usize] + vertices[b as usize]) / 2.0;
            vertices.push(mid);
            (vertices.len() - 1) as u32
        })
    };

    let mut triangles = Vec::with_capacity(mesh.triangle_count() * 4);
    for tri in mesh.triangles() {
        let (a, b, c) = (tri.a(), tri.b(), tri.c());
        let ab = midpoint_of(&mut vertices, a, b);
        let bc = midpoint_of(&mut vertices, b, c);
        let ca = midpoint_of(&mut vertices, c, a);
        triangles.push(Triangle::new(a, ab, ca));
        triangles.push(Triangle::new(ab, b, bc));
        triangles.push(Triangle::new(ca, bc, c));
        triangles.push(Triangle::new(ab, bc, ca));
    }

    Mesh::new(vertices, triangles)
}

/// Unseen triangles (every rating zero) still need a chart even though no
/// camera can colour them; the pipeline later flat-fills these regions or
/// leaves them as background, per `Options::m_mode`.
pub fn unseen_triangle_count(charts: &[Chart]) -> usize {
    charts
        .iter()
        .filter(|c| c.camera.is_none())
        .map(|c| c.triangles.len())
        .sum()
}

/// Distinct cameras actually used across all charts, for diagnostics.
pub fn cameras_used(charts: &[Chart]) -> HashSet<usize> {
    charts.iter().filter_map(|c| c.camera).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn quad_mesh() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
        )
        .unwrap()
    }

    fn overhead_camera() -> Camera {
        Camera::looking_at(
            Vec3::new(0.5, 0.5, -5.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            800.0,
            (320.0, 240.0),
            640,
            480,
            "top.png",
        )
        .unwrap()
    }

    #[test]
    fn uniformly_rated_mesh_forms_one_chart() {
        let mesh = quad_mesh();
        let adjacency = mesh.build_adjacency();
        let mut ratings = RatingMatrix::zeroed(mesh.triangle_count(), 1);
        ratings.set(0, 0, 0.9);
        ratings.set(1, 0, 0.9);
        let cameras = vec![overhead_camera()];
        let charts = build_charts(&mesh, &ratings, &adjacency, &cameras);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].camera, Some(0));
        assert_eq!(charts[0].triangles.len(), 2);
    }

    #[test]
    fn zero_rated_triangle_lands_in_unseen_chart() {
        let mesh = quad_mesh();
        let adjacency = mesh.build_adjacency();
        let mut ratings = RatingMatrix::zeroed(mesh.triangle_count(), 1);
        ratings.set(0, 0, 0.9);
        // triangle 1 left at zero
        let cameras = vec![overhead_camera()];
        let charts = build_charts(&mesh, &ratings, &adjacency, &cameras);
        assert_eq!(charts.len(), 2);
        assert!(charts.iter().any(|c| c.camera.is_none()));
    }

    #[test]
    fn midpoint_subdivide_quadruples_triangle_count() {
        let mesh = quad_mesh();
        let subdivided = midpoint_subdivide(&mesh).unwrap();
        assert_eq!(subdivided.triangle_count(), mesh.triangle_count() * 4);
    }
}
