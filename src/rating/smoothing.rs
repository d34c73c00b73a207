//! One-pass adjacency smoothing of the rating matrix (spec §4.4).
//!
//! Each triangle's new rating for a camera is the average of its own and
//! its edge-adjacent neighbours' ratings for that camera. Triangles with
//! no neighbours (degenerate/disconnected meshes) pass through unchanged.
//! This is a single pass, not an iterated diffusion: it runs once, after
//! shaping, before unwrapping.

use super::RatingMatrix;

pub fn smooth(matrix: &RatingMatrix, adjacency: &[Vec<u32>]) -> RatingMatrix {
    let mut out = matrix.clone();
    for triangle in 0..matrix.num_triangles() {
        let neighbours = &adjacency[triangle];
        let row = out.row_mut(triangle);
        if neighbours.is_empty() {
            row.copy_from_slice(matrix.row(triangle));
            continue;
        }
        let count = (neighbours.len() + 1) as f32;
        for (cam, slot) in row.iter_mut().enumerate() {
            let mut sum = matrix.get(triangle, cam);
            for &n in neighbours {
                sum += matrix.get(n as usize, cam);
            }
            *slot = sum / count;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_triangle_is_unchanged() {
        let mut matrix = RatingMatrix::zeroed(1, 1);
        matrix.set(0, 0, 0.7);
        let smoothed = smooth(&matrix, &[vec![]]);
        assert_eq!(smoothed.get(0, 0), 0.7);
    }

    #[test]
    fn neighbour_pulls_rating_toward_average() {
        let mut matrix = RatingMatrix::zeroed(2, 1);
        matrix.set(0, 0, 1.0);
        matrix.set(1, 0, 0.0);
        let adjacency = vec![vec![1u32], vec![0u32]];
        let smoothed = smooth(&matrix, &adjacency);
        assert_eq!(smoothed.get(0, 0), 0.5);
        assert_eq!(smoothed.get(1, 0), 0.5);
    }

    #[test]
    fn smoothing_uses_pre_smoothing_values_for_all_neighbours() {
        // A chain a-b-c: b's new value should average a, b, c's *old*
        // values, not a partially-updated b.
        let mut matrix = RatingMatrix::zeroed(3, 1);
        matrix.set(0, 0, 1.0);
        matrix.set(1, 0, 0.0);
        matrix.set(2, 0, 1.0);
        let adjacency = vec![vec![1u32], vec![0u32, 2u32], vec![1u32]];
        let smoothed = smooth(&matrix, &adjacency);
        assert_eq!(smoothed.get(1, 0), 2.0 / 3.0);
    }
}
