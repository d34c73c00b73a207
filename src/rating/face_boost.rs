//! Region-of-interest rating boost (spec C6).
//!
//! A caller can flag parts of the photographs as more reliable (say, a
//! calibration target's known-sharp region) and have triangles fully
//! contained in that region rated higher for that camera. This module only
//! defines the seam; callers supply the region test.

use crate::camera::Camera;
use crate::mesh::Mesh;

/// A region of interest in a camera's image. [`RatingMatrix::boost_face_roi`]
/// consults this once per (triangle, camera) pair.
pub trait FaceRoiProvider {
    /// Whether every corner of `triangle`, once projected into `camera`,
    /// falls inside this camera's region of interest. A triangle with any
    /// corner behind the camera or outside the region is not contained.
    fn contains_triangle(&self, mesh: &Mesh, triangle: usize, camera: &Camera) -> bool;
}

/// A region of interest expressed as an axis-aligned pixel rectangle,
/// shared by all cameras. The common case: a known foreground bounding
/// box supplied alongside the calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRectRoi {
    pub min: (f32, f32),
    pub max: (f32, f32),
}

impl FaceRoiProvider for PixelRectRoi {
    fn contains_triangle(&self, mesh: &Mesh, triangle: usize, camera: &Camera) -> bool {
        let [a, b, c] = mesh.triangle_positions(triangle);
        for corner in [a, b, c] {
            let Some((pixel, depth)) = camera.project(corner) else {
                return false;
            };
            if depth <= 0.0
                || pixel.x < self.min.0
                || pixel.y < self.min.1
                || pixel.x > self.max.0
                || pixel.y > self.max.1
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::mesh::Triangle;

    fn camera() -> Camera {
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

    fn small_triangle_mesh() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(-0.1, -0.1, 0.0),
                Vec3::new(0.1, -0.1, 0.0),
                Vec3::new(0.0, 0.1, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        )
        .unwrap()
    }

    #[test]
    fn triangle_inside_roi_is_contained() {
        let roi = PixelRectRoi { min: (0.0, 0.0), max: (640.0, 480.0) };
        assert!(roi.contains_triangle(&small_triangle_mesh(), 0, &camera()));
    }

    #[test]
    fn triangle_outside_roi_is_not_contained() {
        let roi = PixelRectRoi { min: (0.0, 0.0), max: (10.0, 10.0) };
        assert!(!roi.contains_triangle(&small_triangle_mesh(), 0, &camera()));
    }
}
