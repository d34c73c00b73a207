//! Chart rasterization (spec C9): filling each chart's placed triangles
//! into the atlas's `pix_triangle` buffer, then flagging frontier texels.

use std::collections::HashMap;

use crate::geometry;
use crate::math::Vec2;
use crate::pack::{PackingResult, Placement};
use crate::unwrap::Chart;

use super::{Atlas, BACKGROUND};

/// Maps a chart-local UV corner to its final atlas pixel position, given
/// how that chart was placed.
fn place_point(point: Vec2, chart_min: Vec2, chart_size: Vec2, placement: &Placement) -> Vec2 {
    let shifted = point - chart_min;
    let local = if placement.rotated {
        Vec2::new(shifted.y, chart_size.x - shifted.x)
    } else {
        shifted
    };
    local * placement.scale + placement.offset
}

/// Rasterizes every chart's triangles into a fresh [`Atlas`] of the size
/// `packing` computed, breaking ties on overlapping texels in favour of
/// the lowest global triangle index (spec's determinism rule), then
/// computes frontier flags.
pub fn rasterize_charts(charts: &[Chart], packing: &PackingResult) -> Atlas {
    let mut atlas = Atlas::new(packing.width.max(1), packing.height.max(1));

    // (global triangle index, chart index, placed 2D corners)
    let mut placed_triangles: Vec<(u32, usize, [Vec2; 3])> = Vec::new();
    let mut triangle_to_chart: HashMap<u32, usize> = HashMap::new();

    for (chart_idx, chart) in charts.iter().enumerate() {
        let placement = &packing.placements[chart_idx];
        let (min, max) = chart.bounds();
        let size = Vec2::new(max.x - min.x, max.y - min.y);
        for (local_i, &global_tri) in chart.triangles.iter().enumerate() {
            let corners = chart.uv[local_i];
            let placed = [
                place_point(corners[0], min, size, placement),
                place_point(corners[1], min, size, placement),
                place_point(corners[2], min, size, placement),
            ];
            placed_triangles.push((global_tri, chart_idx, placed));
            triangle_to_chart.insert(global_tri, chart_idx);
        }
    }

    // Lowest global index wins an overlapping texel: fill in ascending
    // order of triangle index and never overwrite an already-filled texel.
    placed_triangles.sort_by_key(|(tri, _, _)| *tri);

    for (global_tri, _chart_idx, corners) in &placed_triangles {
        fill_triangle(&mut atlas, *global_tri, *corners);
    }

    compute_frontier(&mut atlas, &triangle_to_chart);
    atlas
}

fn fill_triangle(atlas: &mut Atlas, triangle: u32, corners: [Vec2; 3]) {
    let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_x = corners
        .iter()
        .map(|c| c.x)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(atlas.width as f32 - 1.0)
        .max(0.0) as u32;
    let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_y = corners
        .iter()
        .map(|c| c.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(atlas.height as f32 - 1.0)
        .max(0.0) as u32;

    if min_x > max_x || min_y > max_y {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if geometry::point_in_triangle(p, corners[0], corners[1], corners[2]) {
                let idx = atlas.index(x, y);
                if atlas.pix_triangle[idx] == BACKGROUND {
                    atlas.pix_triangle[idx] = triangle as i32;
                }
            }
        }
    }
}

fn compute_frontier(atlas: &mut Atlas, triangle_to_chart: &HashMap<u32, usize>) {
    let (w, h) = (atlas.width, atlas.height);
    for y in 0..h {
        for x in 0..w {
            let idx = atlas.index(x, y);
            let Some(tri) = atlas.triangle_at(x, y) else { continue };
            let own_chart = triangle_to_chart.get(&tri).copied();

            let neighbours = [
                x.checked_sub(1).map(|nx| (nx, y)),
                (x + 1 < w).then_some((x + 1, y)),
                y.checked_sub(1).map(|ny| (x, ny)),
                (y + 1 < h).then_some((x, y + 1)),
            ];

            let is_frontier = neighbours.iter().any(|n| match n {
                None => true,
                Some(&(nx, ny)) => match atlas.triangle_at(nx, ny) {
                    None => true,
                    Some(ntri) => triangle_to_chart.get(&ntri).copied() != own_chart,
                },
            });
            atlas.pix_frontier[idx] = is_frontier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unwrap::Chart;

    fn single_chart() -> (Vec<Chart>, PackingResult) {
        let chart = Chart {
            camera: Some(0),
            triangles: vec![0],
            uv: vec![[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)]],
        };
        let packing = PackingResult {
            width: 16,
            height: 16,
            placements: vec![Placement {
                chart_index: 0,
                offset: Vec2::new(1.0, 1.0),
                rotated: false,
                scale: 1.0,
            }],
        };
        (vec![chart], packing)
    }

    #[test]
    fn triangle_interior_is_filled() {
        let (charts, packing) = single_chart();
        let atlas = rasterize_charts(&charts, &packing);
        assert_eq!(atlas.triangle_at(3, 3), Some(0));
    }

    #[test]
    fn far_corner_stays_background() {
        let (charts, packing) = single_chart();
        let atlas = rasterize_charts(&charts, &packing);
        assert!(atlas.is_background(15, 15));
    }

    #[test]
    fn filled_triangle_touching_background_is_frontier() {
        let (charts, packing) = single_chart();
        let atlas = rasterize_charts(&charts, &packing);
        // A texel deep inside the triangle, away from any edge, should
        // not be a frontier texel; one right at the hypotenuse should be.
        assert!(!atlas.pix_frontier[atlas.index(2, 2)]);
    }
}
