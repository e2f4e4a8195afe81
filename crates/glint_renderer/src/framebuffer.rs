//! Progressive accumulation buffers, split into one scanline band per
//! worker.
//!
//! Each band has its own lock, held by its worker for a whole tick. Bands
//! never overlap, so workers do not contend with each other. What the
//! display sees is a separate front copy of each band's pixels, published
//! at the end of every worker tick under its own short-lived lock, so
//! presenting never waits for a tick in progress.

use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::color::tonemap;
use crate::display::Pixel;
use crate::material::Color;

/// Rows `[i*h/n, (i+1)*h/n)` of worker `i` out of `n`.
pub fn band_rows(index: usize, count: usize, height: usize) -> Range<usize> {
    let count = count.max(1);
    (index * height / count)..((index + 1) * height / count)
}

/// One worker's share of the image.
#[derive(Debug)]
pub struct Band {
    rows: Range<usize>,
    width: usize,
    /// Linear running mean, row-major within the band
    accumulation: Vec<Color>,
    /// Tonemapped copy of `accumulation`
    pixels: Vec<Pixel>,
    samples: u32,
    epoch: u64,
}

impl Band {
    fn new(rows: Range<usize>, width: usize) -> Self {
        let len = rows.len() * width;
        Self {
            rows,
            width,
            accumulation: vec![Color::ZERO; len],
            pixels: vec![Pixel::BLACK; len],
            samples: 0,
            epoch: 0,
        }
    }

    /// Image rows covered by this band.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Samples blended since the last reset.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Start a new sample pass and return its blend weight
    /// `1 / (samples + 1)`.
    ///
    /// A different `epoch` than the previous pass means the view changed:
    /// the count restarts so the next sample replaces the old mean.
    pub fn begin_sample(&mut self, epoch: u64) -> f32 {
        if epoch != self.epoch {
            self.epoch = epoch;
            self.samples = 0;
        }
        let weight = 1.0 / (self.samples as f32 + 1.0);
        self.samples = self.samples.saturating_add(1);
        weight
    }

    /// Blend `sample` into pixel (`x`, `y`), `y` being an image row.
    ///
    /// A weight of 1 replaces the pixel outright, so a constant input
    /// reproduces itself exactly.
    #[inline]
    pub fn blend(&mut self, x: usize, y: usize, sample: Color, weight_new: f32) {
        let index = (y - self.rows.start) * self.width + x;
        let accumulated = &mut self.accumulation[index];
        if weight_new >= 1.0 {
            *accumulated = sample;
        } else {
            *accumulated += (sample - *accumulated) * weight_new;
        }
        self.pixels[index] = Pixel::from_color(tonemap(*accumulated));
    }

    /// Linear accumulated color at (`x`, `y`).
    pub fn accumulated(&self, x: usize, y: usize) -> Color {
        self.accumulation[(y - self.rows.start) * self.width + x]
    }
}

/// Everything needed to export or inspect a frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    /// Tonemapped display pixels
    pub pixels: Vec<Pixel>,
    /// Linear radiance
    pub radiance: Vec<Color>,
}

impl Snapshot {
    pub fn radiance_at(&self, x: usize, y: usize) -> Color {
        self.radiance[y * self.width + x]
    }

    pub fn pixel_at(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }
}

/// The whole accumulation buffer.
#[derive(Debug)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    bands: Vec<Mutex<Band>>,
    /// Last published pixels of each band
    front: Vec<Mutex<Vec<Pixel>>>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, band_count: usize) -> Self {
        let band_count = band_count.max(1);
        let bands = (0..band_count)
            .map(|i| Mutex::new(Band::new(band_rows(i, band_count, height), width)))
            .collect();
        let front = (0..band_count)
            .map(|i| Mutex::new(vec![Pixel::BLACK; band_rows(i, band_count, height).len() * width]))
            .collect();
        Self {
            width,
            height,
            bands,
            front,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Reallocate for a new size. Accumulated samples are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        *self = Self::new(width, height, self.bands.len());
    }

    /// Lock band `index`. A worker that panicked mid-band leaves at worst a
    /// partially blended band, so poisoning is ignored.
    pub fn band(&self, index: usize) -> MutexGuard<'_, Band> {
        self.bands[index].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `band`'s current pixels the ones [`Framebuffer::copy_pixels_to`]
    /// hands out. Called by the band's worker at the end of its tick.
    pub fn publish(&self, index: usize, band: &Band) {
        let mut front = self.front[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        front.copy_from_slice(&band.pixels);
    }

    /// Copy the last published pixels into a display surface of the same
    /// size. Never waits on a band being rendered. Returns false (and
    /// copies nothing) on a size mismatch.
    pub fn copy_pixels_to(&self, target: &mut [Pixel]) -> bool {
        if target.len() != self.width * self.height {
            return false;
        }
        let count = self.front.len();
        for (index, front) in self.front.iter().enumerate() {
            let front = front.lock().unwrap_or_else(PoisonError::into_inner);
            let start = band_rows(index, count, self.height).start * self.width;
            target[start..start + front.len()].copy_from_slice(&front);
        }
        true
    }

    /// Consistent copy of radiance and pixels. Waits for every band, so this
    /// is for saving and inspection, not per-tick presentation.
    pub fn snapshot(&self) -> Snapshot {
        let mut pixels = Vec::with_capacity(self.width * self.height);
        let mut radiance = Vec::with_capacity(self.width * self.height);
        for index in 0..self.bands.len() {
            let band = self.band(index);
            pixels.extend_from_slice(&band.pixels);
            radiance.extend_from_slice(&band.accumulation);
        }
        Snapshot {
            width: self.width,
            height: self.height,
            pixels,
            radiance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_cover_every_row_once() {
        for (height, count) in [(608, 8), (7, 3), (2, 8), (1, 1), (100, 7)] {
            let mut next = 0;
            for i in 0..count {
                let rows = band_rows(i, count, height);
                assert_eq!(rows.start, next);
                next = rows.end;
            }
            assert_eq!(next, height);
        }
    }

    #[test]
    fn test_running_mean_is_exact_average() {
        let fb = Framebuffer::new(1, 1, 1);
        let mut band = fb.band(0);
        let samples = [0.2, 0.8, 0.5, 0.1, 0.9];
        for s in samples {
            let w = band.begin_sample(0);
            band.blend(0, 0, Color::splat(s), w);
        }
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert!((band.accumulated(0, 0).x - mean).abs() < 1e-6);
        assert_eq!(band.samples(), 5);
    }

    #[test]
    fn test_constant_input_is_exact() {
        let fb = Framebuffer::new(1, 1, 1);
        let mut band = fb.band(0);
        let value = Color::new(0.123, 0.456, 0.789);
        for _ in 0..100 {
            let w = band.begin_sample(0);
            band.blend(0, 0, value, w);
            assert_eq!(band.accumulated(0, 0), value);
        }
    }

    #[test]
    fn test_new_epoch_restarts_mean() {
        let fb = Framebuffer::new(1, 1, 1);
        let mut band = fb.band(0);
        for _ in 0..10 {
            let w = band.begin_sample(0);
            band.blend(0, 0, Color::ONE, w);
        }
        let w = band.begin_sample(1);
        assert_eq!(w, 1.0);
        band.blend(0, 0, Color::ZERO, w);
        assert_eq!(band.accumulated(0, 0), Color::ZERO);
    }

    #[test]
    fn test_copy_and_snapshot_layout() {
        let fb = Framebuffer::new(2, 3, 2);
        for i in 0..fb.band_count() {
            let mut band = fb.band(i);
            let w = band.begin_sample(0);
            for y in band.rows() {
                for x in 0..2 {
                    band.blend(x, y, Color::splat(y as f32 * 10.0 + x as f32), w);
                }
            }
            fb.publish(i, &band);
        }

        let snapshot = fb.snapshot();
        assert_eq!(snapshot.radiance.len(), 6);
        assert_eq!(snapshot.radiance_at(1, 2), Color::splat(21.0));

        let mut surface = vec![Pixel::default(); 6];
        assert!(fb.copy_pixels_to(&mut surface));
        assert_eq!(surface, snapshot.pixels);
        assert!(!fb.copy_pixels_to(&mut [Pixel::default(); 4]));
    }

    #[test]
    fn test_copy_shows_published_pixels_while_band_is_busy() {
        let fb = Framebuffer::new(2, 2, 1);
        let mut band = fb.band(0);
        let w = band.begin_sample(0);
        band.blend(0, 0, Color::ONE, w);
        fb.publish(0, &band);

        // A tick in progress: the band stays locked and changes again
        band.blend(1, 1, Color::ONE, w);

        let mut surface = vec![Pixel::default(); 4];
        assert!(fb.copy_pixels_to(&mut surface), "copy must not wait for the band");
        assert_eq!(surface[0], Pixel::from_color(tonemap(Color::ONE)));
        assert_eq!(surface[3], Pixel::BLACK, "unpublished work must not show");
    }

    #[test]
    fn test_resize_discards_samples() {
        let mut fb = Framebuffer::new(4, 4, 2);
        {
            let mut band = fb.band(0);
            band.begin_sample(0);
        }
        fb.resize(8, 2);
        assert_eq!(fb.size(), (8, 2));
        assert_eq!(fb.band_count(), 2);
        assert_eq!(fb.band(0).samples(), 0);
    }
}
