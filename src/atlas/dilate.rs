//! Border dilation (spec C11): extends coloured chart interiors outward
//! into the background by a fixed number of iterations, so bilinear/mipmap
//! sampling near a chart's UV border doesn't pick up black background
//! texels. Inpainting of interior holes is out of scope (spec non-goal);
//! this only grows existing colour outward.

use super::Atlas;

/// Runs `iterations` passes of border extension: each pass colours every
/// background texel that has at least one already-coloured 4-neighbour
/// with the average of those neighbours, then marks it as coloured for
/// the next pass. A texel with no coloured neighbour in a given pass is
/// untouched and retried on the next one.
///
/// Passes read a snapshot of which texels are "filled" from the previous
/// pass so that a pass's newly-filled texels don't immediately feed later
/// texels in the same pass — this keeps the result independent of pixel
/// iteration order (spec §5 determinism).
pub fn dilate(atlas: &mut Atlas, iterations: u32) {
    let (w, h) = (atlas.width, atlas.height);
    let mut filled: Vec<bool> = (0..atlas.pixels.len())
        .map(|i| atlas.pix_triangle[i] != super::BACKGROUND)
        .collect();

    for _ in 0..iterations {
        let snapshot_pixels = atlas.pixels.clone();
        let snapshot_filled = filled.clone();
        let mut changed = false;

        for y in 0..h {
            for x in 0..w {
                let idx = atlas.index(x, y);
                if snapshot_filled[idx] {
                    continue;
                }
                let neighbours = [
                    x.checked_sub(1).map(|nx| (nx, y)),
                    (x + 1 < w).then_some((x + 1, y)),
                    y.checked_sub(1).map(|ny| (x, ny)),
                    (y + 1 < h).then_some((x, y + 1)),
                ];

                let mut sum = [0u32; 3];
                let mut count = 0u32;
                for n in neighbours.into_iter().flatten() {
                    let nidx = atlas.index(n.0, n.1);
                    if snapshot_filled[nidx] {
                        let p = snapshot_pixels[nidx];
                        for c in 0..3 {
                            sum[c] += p[c] as u32;
                        }
                        count += 1;
                    }
                }

                if count > 0 {
                    let mut avg = [0u8; 3];
                    for c in 0..3 {
                        avg[c] = (sum[c] / count) as u8;
                    }
                    atlas.pixels[idx] = avg;
                    filled[idx] = true;
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pass_extends_colour_by_one_texel() {
        let mut atlas = Atlas::new(3, 1);
        atlas.pix_triangle[0] = 0;
        atlas.pixels[0] = [100, 100, 100];
        dilate(&mut atlas, 1);
        assert_eq!(atlas.pixels[1], [100, 100, 100]);
        assert_eq!(atlas.pixels[2], [0, 0, 0]); // not reached in one pass
    }

    #[test]
    fn enough_iterations_reach_every_background_texel() {
        let mut atlas = Atlas::new(3, 1);
        atlas.pix_triangle[0] = 0;
        atlas.pixels[0] = [50, 60, 70];
        dilate(&mut atlas, 3);
        assert_eq!(atlas.pixels[2], [50, 60, 70]);
    }

    #[test]
    fn dilation_is_order_independent_within_a_pass() {
        // Two seeds on opposite ends; one pass should extend each by
        // exactly one texel regardless of scan direction.
        let mut atlas = Atlas::new(5, 1);
        atlas.pix_triangle[0] = 0;
        atlas.pixels[0] = [200, 0, 0];
        atlas.pix_triangle[4] = 1;
        atlas.pixels[4] = [0, 200, 0];
        dilate(&mut atlas, 1);
        assert_eq!(atlas.pixels[1], [200, 0, 0]);
        assert_eq!(atlas.pixels[3], [0, 200, 0]);
        assert_eq!(atlas.pixels[2], [0, 0, 0]);
    }
}
