//! Geometry primitives (spec C1): triangle normals, 2D point-in-triangle
//! and barycentric coordinates, segment-triangle intersection, 2D line
//! intersection.
//!
//! All functions here are pure and degenerate-input-safe: a zero-area
//! triangle or a pair of parallel lines returns an explicit "no result"
//! rather than a NaN-bearing value (spec §4.1).

use crate::math::{Vec2, Vec3};

/// The outward-facing normal of the triangle `(a, b, c)`, or `None` if the
/// triangle is degenerate (zero area).
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let n = (b - a).cross(c - a);
    n.normalize_checked()
}

/// Twice the signed area of the 2D triangle `(a, b, c)`. Positive for
/// counter-clockwise winding.
pub fn signed_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).cross(c - a)
}

/// Barycentric coordinates of `p` with respect to the 2D triangle
/// `(a, b, c)`, or `None` if the triangle is degenerate.
///
/// The returned `[u, v, w]` sum to 1 and satisfy
/// `p = a * u + b * v + c * w`.
pub fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<[f32; 3]> {
    let area2 = signed_area2(a, b, c);
    if area2.abs() < f32::EPSILON {
        return None;
    }
    let inv_area2 = 1.0 / area2;
    let u = signed_area2(p, b, c) * inv_area2;
    let v = signed_area2(a, p, c) * inv_area2;
    let w = 1.0 - u - v;
    Some([u, v, w])
}

/// Whether `p` lies inside (boundary inclusive) the 2D triangle
/// `(a, b, c)`, using sign-consistent edge tests. Degenerate triangles
/// never contain any point.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    match barycentric(p, a, b, c) {
        Some([u, v, w]) => {
            let eps = -1e-6;
            u >= eps && v >= eps && w >= eps
        }
        None => false,
    }
}

/// Result of a line-triangle intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTriangleHit {
    pub point: Vec3,
    /// Parametric position along the segment `a + t * (b - a)`, in `[0, 1]`
    /// for a hit strictly between the endpoints.
    pub t: f32,
}

/// Möller-Trumbore segment-triangle intersection. Returns `None` for a
/// degenerate triangle, a segment parallel to the triangle's plane, or an
/// intersection outside the segment's endpoints or the triangle.
pub fn segment_triangle_intersection(
    seg_a: Vec3,
    seg_b: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<SegmentTriangleHit> {
    const EPS: f32 = 1e-7;

    let dir = seg_b - seg_a;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);

    if det.abs() < EPS {
        return None; // parallel to the plane, or degenerate triangle
    }
    let inv_det = 1.0 / det;

    let tvec = seg_a - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some(SegmentTriangleHit {
        point: seg_a + dir * t,
        t,
    })
}

/// Intersection of two 2D lines, each given as a point and a direction.
/// Returns `None` for parallel (or anti-parallel) lines.
pub fn line_intersection(a: Vec2, dir_a: Vec2, b: Vec2, dir_b: Vec2) -> Option<Vec2> {
    let denom = dir_a.cross(dir_b);
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let diff = b - a;
    let t = diff.cross(dir_b) / denom;
    Some(a + dir_a * t)
}

/// Whether segment `(p1, p2)` intersects segment `(p3, p4)`, boundary
/// exclusive (used by the packer to check candidate chart placements for
/// overlap). Returns the intersection point when it exists.
pub fn segment_segment_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.cross(d2);
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let diff = p3 - p1;
    let t = diff.cross(d2) / denom;
    let s = diff.cross(d1) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
        Some(p1 + d1 * t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_of_xy_triangle_is_plus_or_minus_z() {
        let n = triangle_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(n.z.abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_triangle_has_no_normal() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(triangle_normal(p, p, p).is_none());
    }

    #[test]
    fn barycentric_recovers_vertices() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0));
        let [u, v, w] = barycentric(a, a, b, c).unwrap();
        assert_relative_eq!(u, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v, 0.0, epsilon = 1e-6);
        assert_relative_eq!(w, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn point_in_triangle_boundary_inclusive() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0));
        assert!(point_in_triangle(Vec2::new(2.0, 0.0), a, b, c)); // on edge
        assert!(point_in_triangle(Vec2::new(1.0, 1.0), a, b, c)); // interior
        assert!(!point_in_triangle(Vec2::new(-0.1, -0.1), a, b, c));
    }

    #[test]
    fn segment_hits_triangle_centroid_ray() {
        let v0 = Vec3::new(-1.0, -1.0, 0.0);
        let v1 = Vec3::new(1.0, -1.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);
        let hit = segment_triangle_intersection(
            Vec3::new(0.0, -0.33, -5.0),
            Vec3::new(0.0, -0.33, 5.0),
            v0,
            v1,
            v2,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn parallel_segment_misses() {
        let v0 = Vec3::new(-1.0, -1.0, 0.0);
        let v1 = Vec3::new(1.0, -1.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);
        let hit = segment_triangle_intersection(
            Vec3::new(-5.0, 0.0, 1.0),
            Vec3::new(5.0, 0.0, 1.0),
            v0,
            v1,
            v2,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let r = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 0.0),
        );
        assert!(r.is_none());
    }

    #[test]
    fn crossing_lines_intersect_at_expected_point() {
        let r = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, -2.0),
            Vec2::new(0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(r.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(r.y, 0.0, epsilon = 1e-6);
    }
}
