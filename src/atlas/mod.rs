//! The texture atlas: rasterization (C9), colouring (C10) and dilation
//! (C11) of packed charts into a final RGB image.

pub mod color;
pub mod dilate;
pub mod rasterize;

pub use color::{colour_atlas, colour_vertices, ColorMode};
pub use rasterize::rasterize_charts;

/// Sentinel `pix_triangle`/`pix_frontier` value for a background texel
/// (not covered by any chart).
pub const BACKGROUND: i32 = -1;

/// A rasterized-but-not-yet-coloured atlas: per-texel triangle ownership
/// and frontier flags, plus the RGB buffer colouring fills in (spec §4.9,
/// §4.10).
#[derive(Debug, Clone)]
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    /// Global triangle index owning each texel, or [`BACKGROUND`].
    pub pix_triangle: Vec<i32>,
    /// `true` for an interior texel with a background or
    /// different-chart 4-neighbour (spec §4.9's frontier definition).
    pub pix_frontier: Vec<bool>,
    /// Final RGB pixels, `(r, g, b)` per texel, row-major. Starts at
    /// black/background and is filled in by [`color::colour_atlas`].
    pub pixels: Vec<[u8; 3]>,
}

impl Atlas {
    pub fn new(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pix_triangle: vec![BACKGROUND; n],
            pix_frontier: vec![false; n],
            pixels: vec![[0, 0, 0]; n],
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn is_background(&self, x: u32, y: u32) -> bool {
        self.pix_triangle[self.index(x, y)] == BACKGROUND
    }

    pub fn triangle_at(&self, x: u32, y: u32) -> Option<u32> {
        let t = self.pix_triangle[self.index(x, y)];
        if t == BACKGROUND {
            None
        } else {
            Some(t as u32)
        }
    }
}
