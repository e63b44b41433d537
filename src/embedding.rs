//! Additive watermark embedding.
//!
//! The embedder widens every 8-bit intensity to `i16`, adds the pattern value
//! for that pixel, and narrows the sum back to `[0, 255]` with clamping:
//! `watermarked = clamp(original + pattern, 0, 255)`

use image::{DynamicImage, GrayImage};

use crate::error::{Error, Result};
use crate::pattern::Pattern;

/// Widen an 8-bit intensity for signed arithmetic.
#[must_use]
pub fn widen(value: u8) -> i16 {
    i16::from(value)
}

/// Narrow a signed intensity to 8 bits, clamping to `[0, 255]`.
#[must_use]
pub fn narrow(value: i16) -> u8 {
    u8::try_from(value.clamp(0, i16::from(u8::MAX))).unwrap_or(u8::MAX)
}

/// Add `pattern` to `image` element-wise with saturation.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the pattern and image shapes differ.
pub fn apply_pattern(image: &GrayImage, pattern: &Pattern) -> Result<GrayImage> {
    if image.dimensions() != pattern.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: image.dimensions(),
            actual: pattern.dimensions(),
        });
    }

    let raw = image
        .as_raw()
        .iter()
        .zip(pattern.values())
        .map(|(&px, &delta)| narrow(widen(px).saturating_add(delta)))
        .collect();

    GrayImage::from_raw(image.width(), image.height(), raw).ok_or(Error::DimensionMismatch {
        expected: image.dimensions(),
        actual: pattern.dimensions(),
    })
}

/// Embed the watermark for `(strength, seed)` into a grayscale image.
///
/// Returns a new buffer; the input is left untouched.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] for an empty image and
/// [`Error::InvalidStrength`] for a zero strength.
pub fn embed(image: &GrayImage, strength: u8, seed: u64) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    let pattern = Pattern::generate(width, height, strength, seed)?;
    let watermarked = apply_pattern(image, &pattern)?;
    tracing::debug!(width, height, strength, seed, "embedded watermark");
    Ok(watermarked)
}

/// Convert any decoded image to luma and embed the watermark.
///
/// Colour and alpha channels are discarded before embedding.
///
/// # Errors
///
/// See [`embed`].
pub fn embed_dynamic(image: &DynamicImage, strength: u8, seed: u64) -> Result<GrayImage> {
    embed(&image.to_luma8(), strength, seed)
}
