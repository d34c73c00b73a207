//! Calibrated pinhole camera model (spec §3 Camera, C2).
//!
//! Unlike the interactive FPS camera this crate grew out of, a [`Camera`]
//! here is immutable once built: its intrinsics and extrinsics come from
//! an external calibration file, not from user input. Skew is assumed
//! zero, matching spec §4.2.
//!
//! # Coordinate system
//!
//! World space is an arbitrary right-handed frame (whatever the
//! calibration was computed in). Camera space has `+z` pointing along the
//! view direction (away from the camera, into the scene), `+x` right and
//! `+y` up; this is the convention [`Camera::world_to_camera`] produces.
//! Image space has the origin at the top-left pixel, `+x` right, `+y` down.

use crate::math::Vec3;

/// A point in camera-local coordinates: `+z` is depth along the view
/// direction.
pub type CameraSpacePoint = Vec3;

/// Intrinsics + extrinsics of one calibrated photograph (spec §3 Camera).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera centre in world space.
    position: Vec3,
    /// Orthonormal world-space basis vectors of the camera frame:
    /// `[right, up, forward]`. Row `i` dotted with a world-space offset
    /// gives that offset's camera-space component `i`.
    axes: [Vec3; 3],
    /// Shared focal length in pixels (`fx == fy`; skew is zero per spec §4.2).
    focal_length: f32,
    /// Principal point in pixels, `(cx, cy)`.
    principal_point: (f32, f32),
    width: u32,
    height: u32,
    /// Path to the photograph this camera's ratings/colours are sampled
    /// from. Opaque to this crate; handed to the image cache/decoder.
    image_path: String,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        right: Vec3,
        up: Vec3,
        forward: Vec3,
        focal_length: f32,
        principal_point: (f32, f32),
        width: u32,
        height: u32,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            position,
            axes: [right, up, forward],
            focal_length,
            principal_point,
            width,
            height,
            image_path: image_path.into(),
        }
    }

    /// Builds a camera looking from `position` toward `target`, with
    /// `world_up` used to disambiguate roll (standard look-at
    /// construction, same idea as the old FPS camera's `looking_at`).
    pub fn looking_at(
        position: Vec3,
        target: Vec3,
        world_up: Vec3,
        focal_length: f32,
        principal_point: (f32, f32),
        width: u32,
        height: u32,
        image_path: impl Into<String>,
    ) -> Option<Self> {
        let forward = (target - position).normalize_checked()?;
        let right = forward.cross(world_up).normalize_checked()?;
        let up = right.cross(forward);
        Some(Self::new(
            position,
            right,
            up,
            forward,
            focal_length,
            principal_point,
            width,
            height,
            image_path,
        ))
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.axes[2]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    pub fn principal_point(&self) -> (f32, f32) {
        self.principal_point
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Transforms a world point into camera space (`+z` = depth).
    pub fn world_to_camera(&self, world: Vec3) -> CameraSpacePoint {
        let offset = world - self.position;
        Vec3::new(
            self.axes[0].dot(offset),
            self.axes[1].dot(offset),
            self.axes[2].dot(offset),
        )
    }

    /// Projects a world point to `(pixel, depth)`. Returns `None` if the
    /// point is at or behind the camera (non-positive depth), matching
    /// spec §4.1's "no intersection rather than NaN" rule for
    /// ill-conditioned projections.
    pub fn project(&self, world: Vec3) -> Option<(crate::math::Vec2, f32)> {
        let p = self.world_to_camera(world);
        if p.z <= f32::EPSILON {
            return None;
        }
        let (cx, cy) = self.principal_point;
        let u = cx + self.focal_length * (p.x / p.z);
        // Image rows grow downward; camera-space `y` grows upward.
        let v = cy - self.focal_length * (p.y / p.z);
        Some((crate::math::Vec2::new(u, v), p.z))
    }

    /// Whether a world point projects inside the image rectangle and in
    /// front of the camera (spec §4.2).
    pub fn in_frustum(&self, world: Vec3) -> bool {
        match self.project(world) {
            Some((pixel, depth)) => {
                depth > 0.0
                    && pixel.x >= 0.0
                    && pixel.y >= 0.0
                    && pixel.x < self.width as f32
                    && pixel.y < self.height as f32
            }
            None => false,
        }
    }

    /// Whether `pixel` itself lies within the image rectangle.
    pub fn pixel_in_bounds(&self, pixel: crate::math::Vec2) -> bool {
        pixel.x >= 0.0 && pixel.y >= 0.0 && pixel.x < self.width as f32 && pixel.y < self.height as f32
    }

    /// Inverse ray query: the world-space ray through pixel `(x, y)`,
    /// as `(origin, normalized direction)`.
    pub fn ray_through_pixel(&self, x: f32, y: f32) -> (Vec3, Vec3) {
        let (cx, cy) = self.principal_point;
        let dir_camera = Vec3::new((x - cx) / self.focal_length, (cy - y) / self.focal_length, 1.0);
        let dir_world = (self.axes[0] * dir_camera.x)
            + (self.axes[1] * dir_camera.y)
            + (self.axes[2] * dir_camera.z);
        (self.position, dir_world.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::looking_at(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            800.0,
            (320.0, 240.0),
            640,
            480,
            "cam0.png",
        )
        .unwrap()
    }

    #[test]
    fn point_on_axis_projects_to_principal_point() {
        let cam = test_camera();
        let (pixel, depth) = cam.project(Vec3::ZERO).unwrap();
        assert_relative_eq!(pixel.x, 320.0, epsilon = 1e-3);
        assert_relative_eq!(pixel.y, 240.0, epsilon = 1e-3);
        assert_relative_eq!(depth, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn point_behind_camera_has_no_projection() {
        let cam = test_camera();
        assert!(cam.project(Vec3::new(0.0, 0.0, -10.0)).is_none());
    }

    #[test]
    fn point_outside_image_fails_frustum_test() {
        let cam = test_camera();
        assert!(!cam.in_frustum(Vec3::new(1000.0, 0.0, 0.0)));
        assert!(cam.in_frustum(Vec3::ZERO));
    }

    #[test]
    fn ray_through_principal_point_matches_forward() {
        let cam = test_camera();
        let (_, dir) = cam.ray_through_pixel(320.0, 240.0);
        assert_relative_eq!(dir.x, cam.forward().x, epsilon = 1e-4);
        assert_relative_eq!(dir.y, cam.forward().y, epsilon = 1e-4);
        assert_relative_eq!(dir.z, cam.forward().z, epsilon = 1e-4);
    }
}
