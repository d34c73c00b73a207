//! Chart packing (spec C8): shelf-based first-fit placement of charts
//! into a fixed-size atlas, with a uniform scale-to-fit pass and a
//! gutter between neighbours.
//!
//! Charts are packed widest-first into horizontal shelves: each shelf
//! tracks the tallest chart placed on it so far; a chart goes on the
//! first shelf with enough remaining width, or starts a new shelf. This
//! is the same first-fit-decreasing-height idea most texture atlas
//! packers use, traded for simplicity over optimal packing density.

use crate::error::TexturingError;
use crate::math::Vec2;
use crate::unwrap::Chart;

/// Where one chart landed in the atlas: an offset in texels, a rotation,
/// and the uniform scale applied to its local-frame embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub chart_index: usize,
    pub offset: Vec2,
    /// `0` or `90` degrees, applied before `offset` and `scale`.
    pub rotated: bool,
    pub scale: f32,
}

/// The result of packing: final atlas dimensions and one placement per
/// chart, in the same order as the input charts.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingResult {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

/// Texels of empty space left between charts so bilinear sampling near a
/// chart's boundary never bleeds into its neighbour.
const GUTTER: f32 = 2.0;

/// The minimum number of texels a chart's shorter local-frame dimension
/// must retain after scaling. Below this, a chart would be packed into a
/// sliver too small to carry any usable detail, so packing fails outright
/// rather than silently emitting a useless atlas (spec §7, scenario 6).
const MIN_CHART_TEXELS: f32 = 2.0;

/// Packs `charts` to fit within roughly `target_area` texels (spec §6
/// `dimension`), scaling every chart uniformly so the packed layout's
/// total footprint (including gutters) matches the target. Returns
/// [`TexturingError::PackingOverflow`] if the required scale would push
/// any chart's shorter dimension below [`MIN_CHART_TEXELS`], with
/// `suggested` set to the smallest `target_area` that would meet that
/// floor for every chart.
pub fn pack_charts(charts: &[Chart], target_area: u32, power_of_two: bool) -> Result<PackingResult, TexturingError> {
    if charts.is_empty() {
        return Ok(PackingResult { width: 1, height: 1, placements: Vec::new() });
    }

    let sizes: Vec<Vec2> = charts
        .iter()
        .map(|c| {
            let (min, max) = c.bounds();
            Vec2::new((max.x - min.x).max(f32::EPSILON), (max.y - min.y).max(f32::EPSILON))
        })
        .collect();

    let total_footprint: f32 = sizes.iter().map(|s| (s.x + GUTTER) * (s.y + GUTTER)).sum();
    if total_footprint <= 0.0 {
        return Err(TexturingError::Internal("packer: zero total chart footprint".into()));
    }
    // Uniform scale so the *scaled* total footprint matches target_area;
    // footprint scales with the square of a linear scale factor.
    let scale = (target_area as f32 / total_footprint).sqrt();

    // Every chart must keep at least MIN_CHART_TEXELS texels along its
    // shorter side; the tightest chart sets the floor for the whole run.
    let min_required_scale = sizes
        .iter()
        .map(|s| MIN_CHART_TEXELS / s.x.min(s.y))
        .fold(0.0f32, f32::max);

    if !scale.is_finite() || scale < min_required_scale {
        let suggested_area = (total_footprint * min_required_scale * min_required_scale).ceil().max(1.0) as u64;
        return Err(TexturingError::PackingOverflow {
            requested: target_area as u64,
            suggested: suggested_area,
        });
    }

    // Widest-first shelf packing (by scaled width).
    let mut order: Vec<usize> = (0..charts.len()).collect();
    order.sort_by(|&a, &b| (sizes[b].x).partial_cmp(&sizes[a].x).unwrap());

    let atlas_width = (target_area as f32).sqrt().max(1.0);

    struct Shelf {
        y: f32,
        height: f32,
        used_width: f32,
    }
    let mut shelves: Vec<Shelf> = Vec::new();
    let mut placements = vec![
        Placement { chart_index: 0, offset: Vec2::ZERO, rotated: false, scale };
        charts.len()
    ];
    let mut max_width_used = 0.0f32;

    for &i in &order {
        let raw = sizes[i];
        let (w, h, rotated) = if raw.x * scale <= atlas_width || raw.x <= raw.y {
            (raw.x * scale, raw.y * scale, false)
        } else {
            (raw.y * scale, raw.x * scale, true)
        };
        let w = w + GUTTER;
        let h = h + GUTTER;

        let shelf_idx = shelves.iter().position(|s| s.used_width + w <= atlas_width && h <= s.height + 1e-3);
        let shelf_idx = match shelf_idx {
            Some(idx) => idx,
            None => {
                let y = shelves.iter().map(|s| s.y + s.height).fold(0.0, f32::max);
                shelves.push(Shelf { y, height: h, used_width: 0.0 });
                shelves.len() - 1
            }
        };

        let shelf = &mut shelves[shelf_idx];
        let offset = Vec2::new(shelf.used_width, shelf.y);
        shelf.used_width += w;
        shelf.height = shelf.height.max(h);
        max_width_used = max_width_used.max(shelf.used_width);

        placements[i] = Placement { chart_index: i, offset, rotated, scale };
    }

    let total_height = shelves.iter().map(|s| s.y + s.height).fold(0.0, f32::max);
    let (mut width, mut height) = (max_width_used.ceil() as u32, total_height.ceil() as u32);
    if power_of_two {
        width = width.next_power_of_two();
        height = height.next_power_of_two();
    }
    if width == 0 || height == 0 {
        return Err(TexturingError::PackingOverflow {
            requested: target_area as u64,
            suggested: (total_footprint.ceil() as u64).max(1),
        });
    }

    Ok(PackingResult { width, height, placements })
}
