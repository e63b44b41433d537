//! Seeded perturbation pattern generation.
//!
//! A pattern is a grid of `+k`/`-k` values, one per pixel, derived purely from
//! `(width, height, strength, seed)`.
//!
//! # Reproducibility
//!
//! Each call constructs its own `ChaCha20Rng` via `seed_from_u64`, so there is
//! no shared generator state and calls may run on any thread. Every sample
//! consumes exactly one `next_u32()` draw and keeps its top bit; the sequence is
//! walked in row-major order (`y * width + x`), the same order the embedder
//! uses. This keeps patterns bit-identical across platforms and pointer widths.

use image::GrayImage;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};

/// A signed perturbation grid with values in `{-strength, +strength}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    width: u32,
    height: u32,
    strength: u8,
    values: Vec<i16>,
}

impl Pattern {
    /// Generate the pattern for the given dimensions, strength, and seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero and
    /// [`Error::InvalidStrength`] if `strength` is zero.
    pub fn generate(width: u32, height: u32, strength: u8, seed: u64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        if strength == 0 {
            return Err(Error::InvalidStrength(strength));
        }

        let k = i16::from(strength);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let len = width as usize * height as usize;
        let values = (0..len)
            .map(|_| if sample_bit(&mut rng) { k } else { -k })
            .collect();

        tracing::debug!(width, height, strength, seed, "generated pattern");

        Ok(Self {
            width,
            height,
            strength,
            values,
        })
    }

    /// Pattern width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pattern height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` of the pattern.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Magnitude of every value in the pattern.
    #[must_use]
    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Row-major values, length `width * height`.
    #[must_use]
    pub fn values(&self) -> &[i16] {
        &self.values
    }

    /// Value at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<i16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Render the pattern as a black/white image (`-k` as 0, `+k` as 255).
    #[must_use]
    pub fn to_image(&self) -> GrayImage {
        let raw = self
            .values
            .iter()
            .map(|&v| if v > 0 { u8::MAX } else { 0 })
            .collect();
        // Length is width * height by construction.
        GrayImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Draw one uniform bit from the generator.
fn sample_bit(rng: &mut ChaCha20Rng) -> bool {
    rng.next_u32() >> 31 == 1
}

/// Generate a pattern; shorthand for [`Pattern::generate`].
///
/// # Errors
///
/// See [`Pattern::generate`].
pub fn generate_pattern(width: u32, height: u32, strength: u8, seed: u64) -> Result<Pattern> {
    Pattern::generate(width, height, strength, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_give_identical_patterns() {
        let a = Pattern::generate(37, 23, 3, 345_676_543).unwrap();
        let b = Pattern::generate(37, 23, 3, 345_676_543).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn values_are_plus_or_minus_strength() {
        for strength in [1u8, 7, 20, 255] {
            let p = Pattern::generate(16, 9, strength, 42).unwrap();
            let k = i16::from(strength);
            assert!(p.values().iter().all(|&v| v == k || v == -k));
        }
    }

    #[test]
    fn both_signs_occur() {
        let p = Pattern::generate(64, 64, 1, 7).unwrap();
        let positives = p.values().iter().filter(|&&v| v > 0).count();
        assert!(positives > 0 && positives < p.values().len());
        // Roughly balanced for a uniform bit source.
        assert!((1500..2600).contains(&positives), "positives = {positives}");
    }

    #[test]
    fn different_seeds_differ() {
        let a = Pattern::generate(32, 32, 1, 1).unwrap();
        let b = Pattern::generate(32, 32, 1, 2).unwrap();
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn shape_matches_request() {
        let p = Pattern::generate(5, 3, 2, 0).unwrap();
        assert_eq!(p.dimensions(), (5, 3));
        assert_eq!(p.values().len(), 15);
        assert!(p.get(4, 2).is_some());
        assert!(p.get(5, 0).is_none());
        assert!(p.get(0, 3).is_none());
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            Pattern::generate(0, 10, 1, 0),
            Err(Error::InvalidDimensions {
                width: 0,
                height: 10
            })
        ));
        assert!(matches!(
            Pattern::generate(10, 0, 1, 0),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn zero_strength_rejected() {
        assert!(matches!(
            Pattern::generate(4, 4, 0, 0),
            Err(Error::InvalidStrength(0))
        ));
    }

    #[test]
    fn to_image_maps_signs_to_black_and_white() {
        let p = Pattern::generate(8, 8, 4, 99).unwrap();
        let img = p.to_image();
        assert_eq!(img.dimensions(), (8, 8));
        for (px, &v) in img.pixels().zip(p.values()) {
            assert_eq!(px[0], if v > 0 { 255 } else { 0 });
        }
    }
}
