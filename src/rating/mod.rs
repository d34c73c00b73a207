//! Camera rating (spec C4, C6): for every (triangle, camera) pair, a score
//! in `[0, 1]` saying how well-suited that camera is to texture that
//! triangle. Ratings feed the unwrapper, which assigns each triangle to its
//! highest-rated camera.
//!
//! The pipeline over a raw rating matrix is, in order:
//! 1. [`RatingMatrix::compute`] — one of the four strategies in
//!    [`strategy`], producing raw, unshaped scores.
//! 2. [`RatingMatrix::normalize_by_row_max`] — each triangle's row divided
//!    by its own max so the winning camera reads `1.0` before shaping
//!    (spec §4.4, the `w(1) = 1` invariant of spec §8).
//! 3. [`RatingMatrix::shape`] — [`shaping::shape`] per entry (spec §4.4).
//! 4. [`RatingMatrix::smooth`] — [`smoothing::smooth`], one adjacency pass.
//! 5. [`RatingMatrix::boost_face_roi`] — [`face_boost`], an optional
//!    multiplier for triangles fully inside a region of interest.

pub mod face_boost;
pub mod shaping;
pub mod smoothing;
pub mod strategy;

use crate::camera::Camera;
use crate::config::CamAssignMode;
use crate::mesh::Mesh;

pub use face_boost::FaceRoiProvider;
pub use strategy::OcclusionQuery;

/// Dense `[triangle][camera]` table of ratings in `[0, 1]`.
///
/// Zero means "this camera must not be used for this triangle" (e.g. the
/// triangle faces away from it, or every vertex is occluded under
/// `AREA_OCCL`); it is never assigned, even when it is the least-bad
/// option (spec §4.5, the "unseen" chart).
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    num_triangles: usize,
    num_cameras: usize,
    values: Vec<f32>,
}

impl RatingMatrix {
    /// Builds an all-zero matrix of the given shape; useful for tests and
    /// for callers assembling a matrix outside the usual [`Self::compute`]
    /// pipeline.
    pub fn zeroed(num_triangles: usize, num_cameras: usize) -> Self {
        Self {
            num_triangles,
            num_cameras,
            values: vec![0.0; num_triangles * num_cameras],
        }
    }

    #[inline]
    fn index(&self, triangle: usize, camera: usize) -> usize {
        triangle * self.num_cameras + camera
    }

    pub fn get(&self, triangle: usize, camera: usize) -> f32 {
        self.values[self.index(triangle, camera)]
    }

    pub fn set(&mut self, triangle: usize, camera: usize, value: f32) {
        let idx = self.index(triangle, camera);
        self.values[idx] = value;
    }

    pub fn num_triangles(&self) -> usize {
        self.num_triangles
    }

    pub fn num_cameras(&self) -> usize {
        self.num_cameras
    }

    /// Ratings of a single triangle across all cameras.
    pub fn row(&self, triangle: usize) -> &[f32] {
        let start = self.index(triangle, 0);
        &self.values[start..start + self.num_cameras]
    }

    fn row_mut(&mut self, triangle: usize) -> &mut [f32] {
        let start = triangle * self.num_cameras;
        &mut self.values[start..start + self.num_cameras]
    }

    /// The camera with the highest rating for `triangle`, and its rating.
    /// Ties resolve to the lowest camera index (spec's determinism rule).
    pub fn best_camera(&self, triangle: usize) -> (usize, f32) {
        let row = self.row(triangle);
        let mut best_cam = 0;
        let mut best_val = row[0];
        for (cam, &val) in row.iter().enumerate().skip(1) {
            if val > best_val {
                best_val = val;
                best_cam = cam;
            }
        }
        (best_cam, best_val)
    }

    /// Computes the raw (unshaped) rating matrix for `mode`, given the
    /// mesh and the candidate cameras. `occlusion` is consulted only by
    /// `AreaOccl`; pass `None` for other modes, or to have occlusion
    /// treated as "always visible" for testing.
    pub fn compute(
        mesh: &Mesh,
        cameras: &[Camera],
        mode: CamAssignMode,
        occlusion: Option<&dyn OcclusionQuery>,
    ) -> Self {
        let num_triangles = mesh.triangle_count();
        let num_cameras = cameras.len();

        #[cfg(feature = "parallel")]
        let values: Vec<f32> = {
            use rayon::prelude::*;
            (0..num_triangles)
                .into_par_iter()
                .flat_map_iter(|triangle| {
                    (0..num_cameras).map(move |cam_idx| {
                        strategy::rate(mesh, triangle, &cameras[cam_idx], cam_idx, mode, occlusion)
                            .clamp(0.0, 1.0)
                    })
                })
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let values: Vec<f32> = {
            let mut values = Vec::with_capacity(num_triangles * num_cameras);
            for triangle in 0..num_triangles {
                for (cam_idx, camera) in cameras.iter().enumerate() {
                    let raw = strategy::rate(mesh, triangle, camera, cam_idx, mode, occlusion);
                    values.push(raw.clamp(0.0, 1.0));
                }
            }
            values
        };

        Self { num_triangles, num_cameras, values }
    }

    /// Normalizes every triangle's row by its own max rating, so the
    /// best-rated camera for each triangle reads exactly `1.0` (spec
    /// §4.4). Rows that are all zero (no camera rates this triangle at
    /// all) are left untouched — there is no camera to normalize toward,
    /// and `shape` already maps zero to zero.
    pub fn normalize_by_row_max(&mut self) {
        for t in 0..self.num_triangles {
            let row_max = self.row(t).iter().cloned().fold(0.0f32, f32::max);
            if row_max > 0.0 {
                for v in self.row_mut(t) {
                    *v /= row_max;
                }
            }
        }
    }

    /// Applies the winner-take-most shaping function to every entry
    /// in place (spec §4.4). Callers must normalize (see
    /// [`Self::normalize_by_row_max`]) before shaping, since `shape`'s
    /// cutoff and curve are both defined against a per-triangle `[0, 1]`
    /// range with the winning camera at `1.0`.
    pub fn shape(&mut self, alpha: f32, beta: f32) {
        for v in &mut self.values {
            *v = shaping::shape(*v, alpha, beta);
        }
    }

    /// Returns a new matrix with one adjacency-averaging smoothing pass
    /// applied (spec §4.4); does not mutate `self`, since every triangle's
    /// new value depends on its neighbours' *old* values.
    pub fn smooth(&self, adjacency: &[Vec<u32>]) -> Self {
        smoothing::smooth(self, adjacency)
    }

    /// Multiplies every rating of triangles fully contained in a region
    /// of interest by `boost`, clamping back to `[0, 1]` (spec C6).
    pub fn boost_face_roi(&mut self, mesh: &Mesh, cameras: &[Camera], roi: &dyn FaceRoiProvider, boost: f32) {
        for triangle in 0..self.num_triangles {
            for (cam_idx, camera) in cameras.iter().enumerate() {
                if roi.contains_triangle(mesh, triangle, camera) {
                    let idx = self.index(triangle, cam_idx);
                    self.values[idx] = (self.values[idx] * boost).clamp(0.0, 1.0);
                }
            }
        }
    }

    /// True if every camera rates `triangle` at zero: the triangle falls
    /// into the "unseen" chart (spec §4.5).
    pub fn is_unseen(&self, triangle: usize) -> bool {
        self.row(triangle).iter().all(|&v| v <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::mesh::Triangle;

    fn single_triangle_mesh() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        )
        .unwrap()
    }

    fn head_on_camera() -> Camera {
        Camera::looking_at(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            800.0,
            (320.0, 240.0),
            640,
            480,
            "front.png",
        )
        .unwrap()
    }

    fn grazing_camera() -> Camera {
        Camera::looking_at(
            Vec3::new(-4.9, 0.0, -0.9),
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            800.0,
            (320.0, 240.0),
            640,
            480,
            "side.png",
        )
        .unwrap()
    }

    #[test]
    fn head_on_camera_rates_higher_than_grazing() {
        let mesh = single_triangle_mesh();
        let cameras = vec![head_on_camera(), grazing_camera()];
        let matrix = RatingMatrix::compute(&mesh, &cameras, CamAssignMode::NormalVertex, None);
        assert!(matrix.get(0, 0) > matrix.get(0, 1));
    }

    #[test]
    fn best_camera_breaks_ties_on_lowest_index() {
        let mut matrix = RatingMatrix::zeroed(1, 3);
        matrix.set(0, 0, 0.5);
        matrix.set(0, 1, 0.5);
        matrix.set(0, 2, 0.1);
        assert_eq!(matrix.best_camera(0), (0, 0.5));
    }

    #[test]
    fn unseen_triangle_has_no_positive_rating() {
        let matrix = RatingMatrix::zeroed(2, 3);
        assert!(matrix.is_unseen(0));
        assert!(matrix.is_unseen(1));
    }

    #[test]
    fn normalize_by_row_max_sets_winner_to_one() {
        let mut matrix = RatingMatrix::zeroed(1, 3);
        matrix.set(0, 0, 0.2);
        matrix.set(0, 1, 0.1);
        matrix.set(0, 2, 0.05);
        matrix.normalize_by_row_max();
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(0, 1), 0.5);
        assert_eq!(matrix.get(0, 2), 0.25);
    }

    #[test]
    fn normalize_by_row_max_leaves_all_zero_rows_untouched() {
        let mut matrix = RatingMatrix::zeroed(1, 3);
        matrix.normalize_by_row_max();
        assert!(matrix.row(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn low_raw_rating_still_shapes_to_a_full_winner_once_normalized() {
        // A default-ish AREA rating (small fraction of the image) must
        // not be zeroed by shaping once its row is normalized: the
        // winning camera should read w(1) = 1 regardless of how small
        // its raw rating was (spec §8).
        let mut matrix = RatingMatrix::zeroed(1, 1);
        matrix.set(0, 0, 0.02);
        matrix.normalize_by_row_max();
        matrix.shape(0.5, 1.0);
        assert_eq!(matrix.get(0, 0), 1.0);
    }
}
