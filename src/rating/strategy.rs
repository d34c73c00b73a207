//! The four raw rating strategies (spec §4.4 `camAssignMode_`).
//!
//! Every strategy returns a value in `[0, 1]`, clamped by the caller; `0`
//! always means "never assign this triangle to this camera".

use crate::camera::Camera;
use crate::config::CamAssignMode;
use crate::geometry;
use crate::math::Vec3;
use crate::mesh::Mesh;

/// Visibility oracle for [`CamAssignMode::AreaOccl`]. [`crate::occlusion`]
/// provides the real implementation; strategy.rs only depends on this
/// trait so the rating pass doesn't need to know how occlusion is tested.
/// `Sync` lets [`super::RatingMatrix::compute`] share one query across
/// the optional `parallel` feature's per-triangle fan-out.
pub trait OcclusionQuery: Sync {
    /// Whether `vertex` of the mesh is visible from `camera` (no other
    /// triangle blocks the line of sight), excluding self-occlusion by
    /// triangles that share `vertex`.
    fn vertex_visible(&self, mesh: &Mesh, vertex: u32, camera_index: usize) -> bool;
}

/// Computes the raw (pre-shaping) rating of `triangle` under `camera`.
pub fn rate(
    mesh: &Mesh,
    triangle: usize,
    camera: &Camera,
    camera_index: usize,
    mode: CamAssignMode,
    occlusion: Option<&dyn OcclusionQuery>,
) -> f32 {
    match mode {
        CamAssignMode::NormalVertex => rate_normal_vertex(mesh, triangle, camera),
        CamAssignMode::NormalBaricenter => rate_normal_baricenter(mesh, triangle, camera),
        CamAssignMode::Area => rate_area(mesh, triangle, camera),
        CamAssignMode::AreaOccl => rate_area_occl(mesh, triangle, camera, camera_index, occlusion),
    }
}

/// Cosine of the angle between the triangle's face normal and the
/// direction back toward the camera, from the triangle's centroid.
/// Negative (facing away) clamps to zero.
fn rate_normal_vertex(mesh: &Mesh, triangle: usize, camera: &Camera) -> f32 {
    let [a, b, c] = mesh.triangle_positions(triangle);
    let normal = match geometry::triangle_normal(a, b, c) {
        Some(n) => n,
        None => return 0.0,
    };
    let centroid = mesh.triangle_centroid(triangle);
    view_alignment(normal, centroid, camera)
}

/// Like [`rate_normal_vertex`], but averages the alignment at each of the
/// three corners individually rather than using one normal at the
/// centroid; closer to the original per-vertex-normal formulation for
/// meshes without stored vertex normals, this approximates a vertex
/// normal as the face normal evaluated from each corner's own view ray.
fn rate_normal_baricenter(mesh: &Mesh, triangle: usize, camera: &Camera) -> f32 {
    let [a, b, c] = mesh.triangle_positions(triangle);
    let normal = match geometry::triangle_normal(a, b, c) {
        Some(n) => n,
        None => return 0.0,
    };
    let corners = [a, b, c];
    let sum: f32 = corners.iter().map(|&p| view_alignment(normal, p, camera)).sum();
    sum / 3.0
}

/// Cosine of the angle between `normal` and the vector from `point` back
/// to the camera.
fn view_alignment(normal: Vec3, point: Vec3, camera: &Camera) -> f32 {
    let to_camera = match (camera.position() - point).normalize_checked() {
        Some(v) => v,
        None => return 0.0,
    };
    normal.dot(to_camera).max(0.0)
}

/// Projected triangle area in pixels, normalized by the camera's image
/// area so it lands in roughly `[0, 1]`. A triangle with any vertex
/// behind the camera, or degenerate under projection, rates zero.
fn rate_area(mesh: &Mesh, triangle: usize, camera: &Camera) -> f32 {
    let [a, b, c] = mesh.triangle_positions(triangle);
    let projected = [camera.project(a), camera.project(b), camera.project(c)];
    let mut pixels = [crate::math::Vec2::ZERO; 3];
    for (slot, p) in pixels.iter_mut().zip(projected.iter()) {
        match p {
            Some((pixel, _)) => *slot = *pixel,
            None => return 0.0,
        }
    }
    let area2 = geometry::signed_area2(pixels[0], pixels[1], pixels[2]).abs();
    let image_area2 = 2.0 * camera.width() as f32 * camera.height() as f32;
    if image_area2 <= f32::EPSILON {
        return 0.0;
    }
    (area2 / image_area2).min(1.0)
}

/// [`rate_area`], but zeroed if any corner of the triangle is occluded
/// from `camera`'s viewpoint (spec §4.4 `AREA_OCCL`).
fn rate_area_occl(
    mesh: &Mesh,
    triangle: usize,
    camera: &Camera,
    camera_index: usize,
    occlusion: Option<&dyn OcclusionQuery>,
) -> f32 {
    if let Some(query) = occlusion {
        let tri = &mesh.triangles()[triangle];
        for &vertex in &tri.indices {
            if !query.vertex_visible(mesh, vertex, camera_index) {
                return 0.0;
            }
        }
    }
    rate_area(mesh, triangle, camera)
}
