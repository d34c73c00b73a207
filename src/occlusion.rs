//! Per-camera visibility queries via a coarse spatial hash (spec C5).
//!
//! For each camera, [`OcclusionGrid`] buckets triangles by the pixel cell
//! their projected bounding box overlaps. A visibility query for a vertex
//! walks only the triangles sharing that vertex's cell instead of the
//! whole mesh, then tests the segment from the camera to the vertex
//! against each candidate with [`geometry::segment_triangle_intersection`].
//!
//! A triangle that shares the queried vertex is never a valid occluder of
//! it (spec's "a face cannot occlude its own corner" rule), and a hit that
//! grazes a triangle's edge (`t` within [`EDGE_EPSILON`] of either
//! endpoint) is treated as a miss rather than an occlusion, so that
//! adjacent, coplanar-ish faces don't spuriously shadow one another.

use std::collections::HashMap;

use crate::camera::Camera;
use crate::geometry;
use crate::mesh::Mesh;
use crate::rating::OcclusionQuery;

/// Side length, in pixels, of one spatial hash cell.
const CELL_SIZE: f32 = 16.0;

/// Tolerance on the intersection parameter `t` near a segment's own
/// endpoints, so a ray is never blocked by the very triangle it starts or
/// ends on, or by a grazing hit at the vertex itself.
const EDGE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Cell(i32, i32);

/// The occlusion index for a single camera.
struct CameraGrid {
    cells: HashMap<Cell, Vec<u32>>,
}

impl CameraGrid {
    fn build(mesh: &Mesh, camera: &Camera) -> Self {
        let mut cells: HashMap<Cell, Vec<u32>> = HashMap::new();
        for (t, _) in mesh.triangles().iter().enumerate() {
            let [a, b, c] = mesh.triangle_positions(t);
            let projected: Vec<_> = [a, b, c].iter().filter_map(|&p| camera.project(p)).collect();
            if projected.is_empty() {
                continue;
            }
            let min_x = projected.iter().map(|(p, _)| p.x).fold(f32::INFINITY, f32::min);
            let max_x = projected.iter().map(|(p, _)| p.x).fold(f32::NEG_INFINITY, f32::max);
            let min_y = projected.iter().map(|(p, _)| p.y).fold(f32::INFINITY, f32::min);
            let max_y = projected.iter().map(|(p, _)| p.y).fold(f32::NEG_INFINITY, f32::max);

            for cx in cell_range(min_x, max_x) {
                for cy in cell_range(min_y, max_y) {
                    cells.entry(Cell(cx, cy)).or_default().push(t as u32);
                }
            }
        }
        Self { cells }
    }

    fn candidates(&self, pixel: crate::math::Vec2) -> &[u32] {
        let cell = Cell(
            (pixel.x / CELL_SIZE).floor() as i32,
            (pixel.y / CELL_SIZE).floor() as i32,
        );
        self.cells.get(&cell).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

fn cell_range(min: f32, max: f32) -> impl Iterator<Item = i32> {
    let lo = (min / CELL_SIZE).floor() as i32;
    let hi = (max / CELL_SIZE).floor() as i32;
    lo..=hi
}

/// Per-camera occlusion grids for a fixed mesh, built once up front and
/// queried many times by the rating pass (`AREA_OCCL`).
pub struct OcclusionGrid {
    cameras: Vec<Camera>,
    grids: Vec<CameraGrid>,
}

impl OcclusionGrid {
    /// Builds a grid for every camera. `O(triangles * cameras)` up front,
    /// same asymptotic cost as the rating pass itself.
    pub fn build(mesh: &Mesh, cameras: &[Camera]) -> Self {
        let grids = cameras.iter().map(|cam| CameraGrid::build(mesh, cam)).collect();
        Self {
            cameras: cameras.to_vec(),
            grids,
        }
    }

    /// Whether the line segment from `camera`'s centre to `point` is
    /// unobstructed, ignoring triangles in `ignore_triangles` (typically
    /// the triangles incident to the vertex being queried).
    fn segment_visible(
        &self,
        mesh: &Mesh,
        camera_index: usize,
        point: crate::math::Vec3,
        ignore_triangles: &[u32],
    ) -> bool {
        let camera = &self.cameras[camera_index];
        let Some((pixel, _)) = camera.project(point) else {
            return false;
        };
        let grid = &self.grids[camera_index];
        for &candidate in grid.candidates(pixel) {
            if ignore_triangles.contains(&candidate) {
                continue;
            }
            let [v0, v1, v2] = mesh.triangle_positions(candidate as usize);
            if let Some(hit) = geometry::segment_triangle_intersection(camera.position(), point, v0, v1, v2) {
                if hit.t > EDGE_EPSILON && hit.t < 1.0 - EDGE_EPSILON {
                    return false;
                }
            }
        }
        true
    }
}

impl OcclusionQuery for OcclusionGrid {
    fn vertex_visible(&self, mesh: &Mesh, vertex: u32, camera_index: usize) -> bool {
        let incident: Vec<u32> = mesh
            .triangles()
            .iter()
            .enumerate()
            .filter(|(_, tri)| tri.indices.contains(&vertex))
            .map(|(i, _)| i as u32)
            .collect();
        let point = mesh.vertices()[vertex as usize];
        self.segment_visible(mesh, camera_index, point, &incident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::mesh::Triangle;

    fn occluder_and_target() -> (Mesh, Vec<Camera>) {
        // A small triangle sitting directly between the camera and a
        // larger target triangle behind it.
        let mesh = Mesh::new(
            vec![
                // target (indices 0..3), far from the camera
                Vec3::new(-1.0, -1.0, 5.0),
                Vec3::new(1.0, -1.0, 5.0),
                Vec3::new(0.0, 1.0, 5.0),
                // occluder (indices 3..6), between camera and target
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(3, 4, 5)],
        )
        .unwrap();
        let camera = Camera::looking_at(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 1.0, 0.0),
            800.0,
            (320.0, 240.0),
            640,
            480,
            "front.png",
        )
        .unwrap();
        (mesh, vec![camera])
    }

    #[test]
    fn target_vertex_is_occluded_by_nearer_triangle() {
        let (mesh, cameras) = occluder_and_target();
        let grid = OcclusionGrid::build(&mesh, &cameras);
        assert!(!grid.vertex_visible(&mesh, 0, 0));
    }

    #[test]
    fn occluder_vertex_sees_itself() {
        let (mesh, cameras) = occluder_and_target();
        let grid = OcclusionGrid::build(&mesh, &cameras);
        assert!(grid.vertex_visible(&mesh, 3, 0));
    }
}
