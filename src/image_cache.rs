//! Bounded LRU cache of decoded camera photographs (spec C3).
//!
//! Image decoding itself (JPEG/PNG bytes -> pixels) is an external
//! collaborator; this module defines the [`ImageDecoder`] seam a caller
//! plugs a decoder into, with a default backed by the `image` crate, and
//! owns the LRU bookkeeping around it. No `lru`-style crate is pulled in:
//! the rest of this codebase hand-rolls its core data structures (see the
//! `math` module's vectors/matrices) rather than reaching for a crate for
//! something this small, and a `HashMap` + doubly-tracked recency list is
//! the idiom kept here.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbImage;

/// A decoded RGB photograph, 8 bits per channel (spec §3 ImageCache).
pub type DecodedImage = RgbImage;

/// Decodes a photograph from disk. The default [`FileImageDecoder`] shells
/// out to the `image` crate; tests substitute an in-memory decoder so the
/// cache's LRU behaviour can be exercised without real files.
pub trait ImageDecoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, String>;
}

/// Default decoder: reads and decodes an image file from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, String> {
        if !Path::new(path).exists() {
            return Err(format!("no such file: {path}"));
        }
        image::open(path)
            .map(|img| img.to_rgb8())
            .map_err(|e| e.to_string())
    }
}

/// A bounded LRU cache of decoded images, keyed by path (spec §4.3).
///
/// `fetch` decodes on a miss, promotes to most-recently-used on a hit, and
/// evicts the least-recently-used entry before inserting past capacity.
pub struct ImageCache<D: ImageDecoder = FileImageDecoder> {
    decoder: D,
    capacity: usize,
    entries: HashMap<String, Arc<DecodedImage>>,
    /// Recency order, oldest first. Linear scans here are fine: caches
    /// top out in the tens to low hundreds of images (spec's
    /// `imageCacheSize_` default is 75).
    recency: Vec<String>,
}

impl ImageCache<FileImageDecoder> {
    pub fn new(capacity: usize) -> Self {
        Self::with_decoder(capacity, FileImageDecoder)
    }
}

impl<D: ImageDecoder> ImageCache<D> {
    pub fn with_decoder(capacity: usize, decoder: D) -> Self {
        Self {
            decoder,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: Vec::new(),
        }
    }

    /// Fetches the decoded image for `path`, decoding and caching it on a
    /// miss. On decode failure, the image is simply not cached; callers
    /// treat that camera as contributing nothing from then on (spec §4.3).
    pub fn fetch(&mut self, path: &str) -> Result<Arc<DecodedImage>, String> {
        if let Some(img) = self.entries.get(path) {
            let img = Arc::clone(img);
            self.touch(path);
            return Ok(img);
        }

        let decoded = Arc::new(self.decoder.decode(path)?);
        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(path.to_string(), Arc::clone(&decoded));
        self.recency.push(path.to_string());
        tracing::debug!(path, cached = self.entries.len(), "image decoded into cache");
        Ok(decoded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn touch(&mut self, path: &str) {
        if let Some(pos) = self.recency.iter().position(|p| p == path) {
            let entry = self.recency.remove(pos);
            self.recency.push(entry);
        }
    }

    fn evict_lru(&mut self) {
        if self.recency.is_empty() {
            return;
        }
        let lru = self.recency.remove(0);
        self.entries.remove(&lru);
        tracing::debug!(path = %lru, "evicted image from cache");
    }
}

/// Bilinearly samples `image` at floating-point pixel coordinates
/// `(x, y)`. Returns `None` if the sample point falls outside the image
/// (spec §4.9 step 4).
pub fn bilinear_sample(image: &DecodedImage, x: f32, y: f32) -> Option<[f32; 3]> {
    let (width, height) = (image.width() as f32, image.height() as f32);
    if x < 0.0 || y < 0.0 || x >= width || y >= height {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |px: u32, py: u32| -> [f32; 3] {
        let p = image.get_pixel(px, py);
        [p[0] as f32, p[1] as f32, p[2] as f32]
    };

    let p00 = sample(x0, y0);
    let p10 = sample(x1, y0);
    let p01 = sample(x0, y1);
    let p11 = sample(x1, y1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;

    /// An in-memory decoder that counts how many times each path is
    /// actually decoded, so tests can assert on cache hits/misses.
    #[derive(Default)]
    struct CountingDecoder {
        images: StdHashMap<String, DecodedImage>,
        decode_calls: RefCell<StdHashMap<String, usize>>,
    }

    impl CountingDecoder {
        fn with_solid(mut self, path: &str, w: u32, h: u32, rgb: [u8; 3]) -> Self {
            self.images
                .insert(path.to_string(), RgbImage::from_pixel(w, h, image::Rgb(rgb)));
            self
        }

        fn calls(&self, path: &str) -> usize {
            *self.decode_calls.borrow().get(path).unwrap_or(&0)
        }
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, path: &str) -> Result<DecodedImage, String> {
            *self.decode_calls.borrow_mut().entry(path.to_string()).or_insert(0) += 1;
            self.images.get(path).cloned().ok_or_else(|| format!("missing {path}"))
        }
    }

    #[test]
    fn hit_does_not_redecode() {
        let decoder = CountingDecoder::default().with_solid("a.png", 2, 2, [10, 20, 30]);
        let mut cache = ImageCache::with_decoder(4, decoder);
        cache.fetch("a.png").unwrap();
        cache.fetch("a.png").unwrap();
        assert_eq!(cache.decoder.calls("a.png"), 1);
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let decoder = CountingDecoder::default()
            .with_solid("a.png", 1, 1, [1, 1, 1])
            .with_solid("b.png", 1, 1, [2, 2, 2])
            .with_solid("c.png", 1, 1, [3, 3, 3]);
        let mut cache = ImageCache::with_decoder(2, decoder);
        cache.fetch("a.png").unwrap();
        cache.fetch("b.png").unwrap();
        cache.fetch("c.png").unwrap(); // evicts a.png (lru)
        assert!(!cache.contains("a.png"));
        assert!(cache.contains("b.png"));
        assert!(cache.contains("c.png"));
    }

    #[test]
    fn touching_protects_from_eviction() {
        let decoder = CountingDecoder::default()
            .with_solid("a.png", 1, 1, [1, 1, 1])
            .with_solid("b.png", 1, 1, [2, 2, 2])
            .with_solid("c.png", 1, 1, [3, 3, 3]);
        let mut cache = ImageCache::with_decoder(2, decoder);
        cache.fetch("a.png").unwrap();
        cache.fetch("b.png").unwrap();
        cache.fetch("a.png").unwrap(); // a is now MRU, b is LRU
        cache.fetch("c.png").unwrap(); // evicts b.png
        assert!(cache.contains("a.png"));
        assert!(!cache.contains("b.png"));
    }

    #[test]
    fn decode_failure_is_not_cached() {
        let decoder = CountingDecoder::default();
        let mut cache = ImageCache::with_decoder(2, decoder);
        assert!(cache.fetch("missing.png").is_err());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn bilinear_sample_averages_neighbours() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([255, 255, 255]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 1, image::Rgb([255, 255, 255]));
        let sample = bilinear_sample(&img, 0.5, 0.5).unwrap();
        assert!((sample[0] - 127.5).abs() < 1.0);
    }

    #[test]
    fn out_of_bounds_sample_is_none() {
        let img = RgbImage::new(2, 2);
        assert!(bilinear_sample(&img, -1.0, 0.0).is_none());
        assert!(bilinear_sample(&img, 2.0, 0.0).is_none());
    }
}
