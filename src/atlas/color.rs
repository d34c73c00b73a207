//! Atlas colouring (spec C10): for every texel owned by a triangle,
//! blend the top-rated cameras' photographs, rejecting photoconsistency
//! outliers, and dispatch on [`ColorMode`] for the atlas-based `Texture`
//! and `Flat` output modes. [`colour_vertices`] handles the third mode,
//! `Vertex`, which colours mesh vertices directly and has no atlas at
//! all (spec §2 supplemented modes).

use std::collections::HashMap;
use std::sync::Arc;

use crate::camera::Camera;
use crate::config::Options;
use crate::error::{Diagnostic, Diagnostics};
use crate::geometry;
use crate::image_cache::{self, DecodedImage, ImageCache, ImageDecoder};
use crate::math::Vec2;
use crate::mesh::Mesh;
use crate::pack::{PackingResult, Placement};
use crate::rating::RatingMatrix;
use crate::unwrap::Chart;

use super::Atlas;

/// How atlas texels are produced (spec §2 `m_mode` dispatch). `MappingMode::Vertex`
/// has no atlas at all — see [`colour_vertices`] — so it has no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Sample and blend photographs per texel (the normal path).
    Texture,
    /// A single solid debug colour per chart, cycling through a small
    /// palette keyed by chart index — no photographs are sampled.
    Flat,
}

/// A fixed, deterministic debug palette so `ColorMode::Flat` output is
/// stable across runs without depending on hashing or RNG.
const FLAT_PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// Tint applied to background texels when `Options::highlight_occlusions`
/// is set, so occluded-but-unrated regions stand out from ordinary
/// background (spec §6).
const OCCLUSION_HIGHLIGHT: [u8; 3] = [255, 0, 255];

/// Colours every texel of `atlas` in place, sampling photographs through
/// `cache`. Recoverable per-camera failures (an image the decoder can't
/// open) are pushed to `diagnostics` rather than aborting the run.
#[allow(clippy::too_many_arguments)]
pub fn colour_atlas<D: ImageDecoder>(
    atlas: &mut Atlas,
    mesh: &Mesh,
    charts: &[Chart],
    packing: &PackingResult,
    ratings: &RatingMatrix,
    cameras: &[Camera],
    cache: &mut ImageCache<D>,
    options: &Options,
    diagnostics: &mut Diagnostics,
) {
    let triangle_to_chart: HashMap<u32, usize> = charts
        .iter()
        .enumerate()
        .flat_map(|(ci, c)| c.triangles.iter().map(move |&t| (t, ci)))
        .collect();

    if options.m_mode == crate::config::MappingMode::Flat {
        colour_flat(atlas, &triangle_to_chart);
        return;
    }

    // Cache decoded images per camera index up front so a decode failure
    // is reported once per camera, not once per texel.
    let images = load_camera_images(cameras, cache, diagnostics);

    let placed = place_triangles(charts, packing);

    for y in 0..atlas.height {
        for x in 0..atlas.width {
            let idx = atlas.index(x, y);
            let Some(triangle) = atlas.triangle_at(x, y) else {
                if options.highlight_occlusions {
                    atlas.pixels[idx] = OCCLUSION_HIGHLIGHT;
                }
                continue;
            };
            let Some(corners) = placed.get(&triangle) else { continue };
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let Some(bary) = geometry::barycentric(p, corners[0], corners[1], corners[2]) else { continue };

            let world = interpolate_world(mesh, triangle, bary);
            let colour = colour_texel(world, triangle as usize, ratings, cameras, &images, options);
            if let Some(c) = colour {
                atlas.pixels[idx] = c;
            }
        }
    }
}

/// Decodes every camera's photograph through `cache` once, so a missing
/// or unreadable image is reported as a single diagnostic per camera
/// rather than once per texel or vertex that tries to sample it.
fn load_camera_images<D: ImageDecoder>(
    cameras: &[Camera],
    cache: &mut ImageCache<D>,
    diagnostics: &mut Diagnostics,
) -> Vec<Option<Arc<DecodedImage>>> {
    let mut images = Vec::with_capacity(cameras.len());
    for (idx, camera) in cameras.iter().enumerate() {
        match cache.fetch(camera.image_path()) {
            Ok(img) => images.push(Some(img)),
            Err(reason) => {
                diagnostics.push(Diagnostic::ImageUnavailable {
                    camera_index: idx,
                    path: camera.image_path().to_string(),
                    reason,
                });
                images.push(None);
            }
        }
    }
    images
}

/// Default colour for a vertex with no rated, sampleable camera (spec §2
/// `MappingMode::Vertex`'s fallback for an empty camera set or an
/// entirely unseen neighbourhood).
const DEFAULT_VERTEX_COLOR: [u8; 3] = [128, 128, 128];

/// Colours every mesh vertex directly, without packing or rasterizing an
/// atlas (spec §2 `MappingMode::Vertex`). A vertex samples through the
/// best-rated camera of any triangle it's a corner of, trying the next
/// candidate triangle if that one has no usable sample; a vertex with no
/// such candidate (an empty camera set, or every incident triangle
/// unseen) gets [`DEFAULT_VERTEX_COLOR`].
pub fn colour_vertices<D: ImageDecoder>(
    mesh: &Mesh,
    ratings: &RatingMatrix,
    cameras: &[Camera],
    cache: &mut ImageCache<D>,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Vec<[u8; 3]> {
    let images = load_camera_images(cameras, cache, diagnostics);

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); mesh.vertex_count()];
    for (t, tri) in mesh.triangles().iter().enumerate() {
        for &v in &tri.indices {
            incident[v as usize].push(t);
        }
    }

    let mut colors = vec![DEFAULT_VERTEX_COLOR; mesh.vertex_count()];
    for (v, world) in mesh.vertices().iter().enumerate() {
        let mut candidates = incident[v].clone();
        candidates.sort_by(|&a, &b| ratings.best_camera(b).1.partial_cmp(&ratings.best_camera(a).1).unwrap());
        for triangle in candidates {
            if let Some(c) = colour_texel(*world, triangle, ratings, cameras, &images, options) {
                colors[v] = c;
                break;
            }
        }
    }
    colors
}

fn colour_flat(atlas: &mut Atlas, triangle_to_chart: &HashMap<u32, usize>) {
    for idx in 0..atlas.pixels.len() {
        let Some(triangle) = (atlas.pix_triangle[idx] != super::BACKGROUND).then_some(atlas.pix_triangle[idx] as u32)
        else {
            continue;
        };
        if let Some(&chart) = triangle_to_chart.get(&triangle) {
            atlas.pixels[idx] = FLAT_PALETTE[chart % FLAT_PALETTE.len()];
        }
    }
}

/// Placed (atlas-space) 2D corners for every triangle, keyed by global
/// triangle index; mirrors the transform [`super::rasterize`] applies.
fn place_triangles(charts: &[Chart], packing: &PackingResult) -> HashMap<u32, [Vec2; 3]> {
    let mut out = HashMap::new();
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
            out.insert(global_tri, placed);
        }
    }
    out
}

fn place_point(point: Vec2, chart_min: Vec2, chart_size: Vec2, placement: &Placement) -> Vec2 {
    let shifted = point - chart_min;
    let local = if placement.rotated {
        Vec2::new(shifted.y, chart_size.x - shifted.x)
    } else {
        shifted
    };
    local * placement.scale + placement.offset
}

fn interpolate_world(mesh: &Mesh, triangle: u32, bary: [f32; 3]) -> crate::math::Vec3 {
    let [a, b, c] = mesh.triangle_positions(triangle as usize);
    a * bary[0] + b * bary[1] + c * bary[2]
}

/// Blends the top `num_cam_mix` cameras' samples for one texel's world
/// position, running the photoconsistency outlier filter first when
/// `options.photoconsistency` is set (spec §4.9).
fn colour_texel(
    world: crate::math::Vec3,
    triangle: usize,
    ratings: &RatingMatrix,
    cameras: &[Camera],
    images: &[Option<Arc<DecodedImage>>],
    options: &Options,
) -> Option<[u8; 3]> {
    let mut row: Vec<(usize, f32)> = ratings
        .row(triangle)
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r > 0.0)
        .map(|(c, &r)| (c, r))
        .collect();
    row.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    row.truncate(options.num_cam_mix);

    let mut samples: Vec<(usize, f32, [f32; 3])> = Vec::new();
    for (cam_idx, weight) in row {
        let Some(image) = images.get(cam_idx).and_then(|i| i.as_ref()) else { continue };
        let Some((pixel, depth)) = cameras[cam_idx].project(world) else { continue };
        if depth <= 0.0 || !cameras[cam_idx].pixel_in_bounds(pixel) {
            continue;
        }
        let Some(rgb) = image_cache::bilinear_sample(image, pixel.x, pixel.y) else { continue };
        samples.push((cam_idx, weight, rgb));
    }

    if samples.is_empty() {
        return None;
    }

    let kept = if options.photoconsistency {
        reject_outliers(&samples)
    } else {
        samples
    };
    if kept.is_empty() {
        return None;
    }

    let total_weight: f32 = kept.iter().map(|(_, w, _)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }
    let mut accum = [0.0f32; 3];
    for (_, w, rgb) in &kept {
        for c in 0..3 {
            accum[c] += rgb[c] * w;
        }
    }
    Some([
        (accum[0] / total_weight).clamp(0.0, 255.0) as u8,
        (accum[1] / total_weight).clamp(0.0, 255.0) as u8,
        (accum[2] / total_weight).clamp(0.0, 255.0) as u8,
    ])
}

/// Drops samples whose colour is an outlier relative to the group: for
/// each sample, the *mean* distance to every other sample is compared
/// against the median of those mean distances, scaled by a tolerance
/// factor (spec §4.9). With fewer than three samples there's no robust
/// notion of "outlier", so all samples are kept. If rejection would
/// leave fewer than two samples to blend, it falls back to the single
/// highest-weighted original sample instead.
fn reject_outliers(samples: &[(usize, f32, [f32; 3])]) -> Vec<(usize, f32, [f32; 3])> {
    const TOLERANCE: f32 = 2.0;
    if samples.len() < 3 {
        return samples.to_vec();
    }

    let mean_distances: Vec<f32> = samples
        .iter()
        .enumerate()
        .map(|(i, (_, _, a))| {
            let total: f32 = samples
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, (_, _, b))| colour_distance(*a, *b))
                .sum();
            total / (samples.len() - 1) as f32
        })
        .collect();

    let mut sorted_means = mean_distances.clone();
    sorted_means.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let reference = median(&sorted_means).max(1.0);
    let threshold = reference * TOLERANCE;

    let kept: Vec<_> = samples
        .iter()
        .zip(mean_distances.iter())
        .filter(|&(_, &m)| m <= threshold)
        .map(|(s, _)| *s)
        .collect();

    if kept.len() >= 2 {
        kept
    } else {
        vec![highest_weighted(samples)]
    }
}

/// The single sample with the greatest rating weight, used as the
/// photoconsistency fallback when too few samples survive outlier
/// rejection to blend.
fn highest_weighted(samples: &[(usize, f32, [f32; 3])]) -> (usize, f32, [f32; 3]) {
    *samples.iter().max_by(|a, b| a.1.partial_cmp(&b.1).unwrap()).unwrap()
}

fn colour_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

fn median(sorted: &[f32]) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
