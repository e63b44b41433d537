//! Reference-based watermark detection.
//!
//! The candidate is resized to the original's dimensions (bilinear), then the
//! per-pixel absolute difference is compared against a fixed threshold. A single
//! pixel above the threshold is enough to report the image as watermarked; there
//! is no aggregate or statistical vote, so any resampling or re-encoding noise
//! above the threshold also triggers a positive.

use std::fmt;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

use crate::error::{Error, Result};

/// Absolute pixel difference above which a pixel counts as watermark signal.
pub const DETECTION_THRESHOLD: u8 = 15;

/// Interpolation used when the candidate has to be resized.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Outcome of comparing a candidate against its original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detection {
    /// Whether any pixel differs by more than the threshold.
    pub watermarked: bool,
    /// Largest absolute per-pixel difference observed.
    pub max_difference: u8,
    /// Number of pixels whose difference exceeds the threshold.
    pub outliers: usize,
    /// Whether the candidate had to be resized before comparison.
    pub resized: bool,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.watermarked {
            f.write_str("The image appears to be watermarked.")
        } else {
            f.write_str("The image does not seem to be watermarked.")
        }
    }
}

/// Saturating cast of 16-bit luma down to 8 bits (values above 255 become 255).
///
/// Meant for in-memory buffers whose values are already intensities in
/// `[0, 255]` held in a wider type. Decoded 16-bit files use the full
/// `[0, 65535]` range and must be rescaled with `to_luma8` instead.
#[must_use]
pub fn narrow_luma16(image: &ImageBuffer<Luma<u16>, Vec<u16>>) -> GrayImage {
    let raw = image
        .as_raw()
        .iter()
        .map(|&v| u8::try_from(v).unwrap_or(u8::MAX))
        .collect();
    GrayImage::from_raw(image.width(), image.height(), raw)
        .unwrap_or_else(|| GrayImage::new(image.width(), image.height()))
}

/// Detect the watermark using the default threshold of 15.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the original (or candidate) has a
/// zero dimension.
pub fn detect(original: &GrayImage, candidate: &GrayImage) -> Result<Detection> {
    detect_with_threshold(original, candidate, DETECTION_THRESHOLD)
}

/// Detect the watermark with a caller-chosen threshold.
///
/// The original's dimensions are authoritative; a candidate of any other size
/// is resized to match before comparison.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the original (or candidate) has a
/// zero dimension.
pub fn detect_with_threshold(
    original: &GrayImage,
    candidate: &GrayImage,
    threshold: u8,
) -> Result<Detection> {
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let (cand_w, cand_h) = candidate.dimensions();
    if cand_w == 0 || cand_h == 0 {
        return Err(Error::InvalidDimensions {
            width: cand_w,
            height: cand_h,
        });
    }

    let resized = candidate.dimensions() != original.dimensions();
    let resampled;
    let candidate = if resized {
        resampled = imageops::resize(candidate, width, height, RESIZE_FILTER);
        &resampled
    } else {
        candidate
    };

    let mut result = Detection {
        resized,
        ..Detection::default()
    };
    for (a, b) in original.as_raw().iter().zip(candidate.as_raw()) {
        let diff = a.abs_diff(*b);
        result.max_difference = result.max_difference.max(diff);
        if diff > threshold {
            result.outliers += 1;
        }
    }
    result.watermarked = result.outliers > 0;

    tracing::debug!(
        width,
        height,
        resized,
        threshold,
        max_difference = result.max_difference,
        outliers = result.outliers,
        "compared candidate against original"
    );

    Ok(result)
}

/// Detect against an in-memory candidate of any pixel type.
///
/// 16-bit luma is treated as widened 8-bit intensities and narrowed with
/// [`narrow_luma16`]; everything else goes through the `image` crate's luma
/// conversion. Candidates read from disk should go through
/// [`load_gray`](crate::load_gray) instead.
///
/// # Errors
///
/// See [`detect_with_threshold`].
pub fn detect_dynamic(
    original: &GrayImage,
    candidate: &DynamicImage,
    threshold: u8,
) -> Result<Detection> {
    let candidate = match candidate {
        DynamicImage::ImageLuma16(wide) => narrow_luma16(wide),
        other => other.to_luma8(),
    };
    detect_with_threshold(original, &candidate, threshold)
}
