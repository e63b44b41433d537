//! Codec facade and file-level processing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat};

use crate::detection::{self, Detection, DETECTION_THRESHOLD};
use crate::embedding;
use crate::error::{Error, Result};
use crate::pattern::Pattern;

/// Strength used when the caller does not choose one.
pub const DEFAULT_STRENGTH: u8 = 1;

/// Seed used when the caller does not choose one.
pub const DEFAULT_SEED: u64 = 345_676_543;

/// Parameters shared by embedding and detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkOptions {
    /// Per-pixel perturbation magnitude.
    pub strength: u8,
    /// Seed for the pattern generator.
    pub seed: u64,
    /// Detection threshold on absolute pixel difference.
    pub threshold: u8,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            seed: DEFAULT_SEED,
            threshold: DETECTION_THRESHOLD,
        }
    }
}

/// Options controlling file-level processing.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Codec parameters.
    pub watermark: WatermarkOptions,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Where the output was written, if anything was written.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (not a supported image).
    pub skipped: bool,
    /// Detection outcome, for detection runs.
    pub detection: Option<Detection>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            skipped: false,
            detection: None,
            message: String::new(),
        }
    }
}

/// Stateless entry point for pattern generation, embedding, and detection.
///
/// Holds only the [`WatermarkOptions`]; every call is independent and may be
/// retried or run concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkCodec {
    options: WatermarkOptions,
}

impl WatermarkCodec {
    /// Create a codec with the given options.
    #[must_use]
    pub fn new(options: WatermarkOptions) -> Self {
        Self { options }
    }

    /// The options this codec was built with.
    #[must_use]
    pub fn options(&self) -> &WatermarkOptions {
        &self.options
    }

    /// Generate the pattern for an image of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] or [`Error::InvalidStrength`].
    pub fn generate_pattern(&self, width: u32, height: u32) -> Result<Pattern> {
        Pattern::generate(width, height, self.options.strength, self.options.seed)
    }

    /// Embed the watermark into a grayscale buffer.
    ///
    /// # Errors
    ///
    /// See [`embedding::embed`].
    pub fn embed(&self, image: &GrayImage) -> Result<GrayImage> {
        embedding::embed(image, self.options.strength, self.options.seed)
    }

    /// Compare a candidate against the original.
    ///
    /// # Errors
    ///
    /// See [`detection::detect_with_threshold`].
    pub fn detect(&self, original: &GrayImage, candidate: &GrayImage) -> Result<Detection> {
        detection::detect_with_threshold(original, candidate, self.options.threshold)
    }

    /// Load an image file and embed the watermark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageDecode`] if the file cannot be read or decoded,
    /// plus anything [`WatermarkCodec::embed`] returns.
    pub fn embed_path(&self, input: &Path) -> Result<GrayImage> {
        let image = load_gray(input)?;
        self.embed(&image)
    }

    /// Load the original from disk and compare an 8-bit candidate against it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageDecode`] if the original cannot be decoded.
    pub fn detect_path(&self, original: &Path, candidate: &GrayImage) -> Result<Detection> {
        let original = load_gray(original)?;
        self.detect(&original, candidate)
    }

    /// Load, embed, and save a single file.
    #[must_use]
    pub fn embed_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let watermarked = match self.embed_path(input) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to embed: {e}");
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&watermarked, output) {
            Ok(()) => {
                tracing::info!(input = %input.display(), output = %output.display(), "watermark embedded");
                result.success = true;
                result.output = Some(output.to_path_buf());
                result.message = format!(
                    "Watermark embedded (strength={}, seed={})",
                    self.options.strength, self.options.seed
                );
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Load an original and a candidate file and compare them.
    ///
    /// Both files go through [`load_gray`], so a 16-bit file is rescaled the
    /// same way on either side.
    #[must_use]
    pub fn detect_files(&self, original: &Path, candidate: &Path) -> ProcessResult {
        let mut result = ProcessResult::new(candidate);

        let candidate_img = match load_gray(candidate) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load candidate: {e}");
                return result;
            }
        };

        match self.detect_path(original, &candidate_img) {
            Ok(detection) => {
                tracing::info!(
                    candidate = %candidate.display(),
                    watermarked = detection.watermarked,
                    "detection finished"
                );
                result.success = true;
                result.message = detection.to_string();
                result.detection = Some(detection);
            }
            Err(e) => {
                result.message = format!("Failed to detect: {e}");
            }
        }

        result
    }

    /// Embed the watermark into every supported image in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Outputs are written as PNG into `output_dir`. Files with an unsupported
    /// extension are reported as skipped. When two inputs map to the same
    /// output name (`photo.png` and `photo.jpg`), the first in file-name order
    /// is processed and the other fails without writing.
    #[must_use]
    pub fn embed_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .collect(),
            Err(e) => {
                let mut failed = ProcessResult::new(input_dir);
                failed.message = format!("Failed to read directory: {e}");
                return vec![failed];
            }
        };
        files.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut failed = ProcessResult::new(output_dir);
                failed.message = format!("Failed to create output directory: {e}");
                return vec![failed];
            }
        }

        let mut rejected = Vec::new();
        let mut claimed = HashSet::new();
        let mut jobs = Vec::with_capacity(files.len());
        for input in files {
            if !is_supported_image(&input) {
                let mut result = ProcessResult::new(&input);
                result.success = true;
                result.skipped = true;
                result.message = "Unsupported image format".to_string();
                rejected.push(result);
                continue;
            }

            let output = output_dir.join(watermarked_file_name(&input));
            if !claimed.insert(output.clone()) {
                let mut result = ProcessResult::new(&input);
                result.message = format!(
                    "Output {} already written for another input",
                    output.display()
                );
                rejected.push(result);
                continue;
            }
            jobs.push((input, output));
        }

        let process = |(input, output): &(PathBuf, PathBuf)| self.embed_file(input, output);

        #[cfg(feature = "cli")]
        let mut results: Vec<ProcessResult> = {
            use rayon::prelude::*;
            jobs.par_iter().map(process).collect()
        };

        #[cfg(not(feature = "cli"))]
        let mut results: Vec<ProcessResult> = jobs.iter().map(process).collect();

        results.extend(rejected);
        results
    }
}

/// Decode an image file and convert it to 8-bit grayscale.
///
/// # Errors
///
/// Returns [`Error::ImageDecode`] for unreadable, corrupt, or unsupported files.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).map_err(Error::ImageDecode)?;
    Ok(img.to_luma8())
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

/// Save a grayscale image as PNG.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if `path` does not name a PNG file,
/// or an I/O / encoding error if writing fails.
pub fn save_image(img: &GrayImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    if format != ImageFormat::Png {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn watermarked_file_name(input: &Path) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_watermarked.png")
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_watermarked.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(watermarked_file_name(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "seeded-watermark-engine-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_options_match_reference_constants() {
        let opts = WatermarkOptions::default();
        assert_eq!(opts.strength, 1);
        assert_eq!(opts.seed, 345_676_543);
        assert_eq!(opts.threshold, 15);
    }

    #[test]
    fn default_output_path_appends_watermarked_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_watermarked.png"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "image_watermarked.png"
        );
    }

    #[test]
    fn is_supported_image_accepts_png_and_jpeg() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
    }

    #[test]
    fn is_supported_image_rejects_other_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.bmp")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn save_image_rejects_non_png() {
        let img = GrayImage::new(4, 4);
        let path = temp_dir("save").join("out.jpg");
        assert!(matches!(
            save_image(&img, &path),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_gray_reports_decode_error() {
        let path = temp_dir("corrupt").join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_gray(&path), Err(Error::ImageDecode(_))));
    }

    #[test]
    fn codec_uses_its_options() {
        let codec = WatermarkCodec::new(WatermarkOptions {
            strength: 20,
            seed: 1,
            threshold: 15,
        });
        let pattern = codec.generate_pattern(8, 8).unwrap();
        assert_eq!(pattern, Pattern::generate(8, 8, 20, 1).unwrap());

        let img = GrayImage::from_pixel(8, 8, image::Luma([128]));
        let marked = codec.embed(&img).unwrap();
        assert!(codec.detect(&img, &marked).unwrap().watermarked);
    }

    #[test]
    fn embed_file_writes_png_that_detects() {
        let dir = temp_dir("embed-file");
        let input = dir.join("input.png");
        let output = dir.join("nested").join("input_watermarked.png");
        GrayImage::from_fn(32, 32, |x, y| image::Luma([u8::try_from(x * 4 + y).unwrap()]))
            .save(&input)
            .unwrap();

        let codec = WatermarkCodec::new(WatermarkOptions {
            strength: 20,
            ..WatermarkOptions::default()
        });
        let result = codec.embed_file(&input, &output);
        assert!(result.success, "{}", result.message);
        assert_eq!(result.output.as_deref(), Some(output.as_path()));

        let detected = codec.detect_files(&input, &output);
        assert!(detected.success, "{}", detected.message);
        assert!(detected.detection.unwrap().watermarked);
    }

    #[test]
    fn embed_file_reports_missing_input() {
        let dir = temp_dir("missing");
        let codec = WatermarkCodec::default();
        let result = codec.embed_file(&dir.join("nope.png"), &dir.join("out.png"));
        assert!(!result.success);
        assert!(result.message.contains("Failed to embed"));
    }

    #[test]
    fn sixteen_bit_file_is_not_watermarked_against_itself() {
        let path = temp_dir("luma16").join("wide.png");
        let wide: image::ImageBuffer<image::Luma<u16>, Vec<u16>> =
            image::ImageBuffer::from_fn(16, 16, |x, y| {
                image::Luma([u16::try_from(x * 16 + y).unwrap() * 257])
            });
        wide.save(&path).unwrap();

        let result = WatermarkCodec::default().detect_files(&path, &path);
        assert!(result.success, "{}", result.message);
        let detection = result.detection.unwrap();
        assert!(!detection.watermarked);
        assert_eq!(detection.max_difference, 0);
    }

    #[test]
    fn embed_directory_rejects_colliding_output_names() {
        let dir = temp_dir("collide");
        let input = dir.join("in");
        let output = dir.join("out");
        std::fs::create_dir_all(&input).unwrap();
        let img =
            GrayImage::from_fn(16, 16, |x, y| image::Luma([u8::try_from(x * 8 + y).unwrap()]));
        img.save(input.join("photo.png")).unwrap();
        img.save(input.join("photo.jpg")).unwrap();

        let codec = WatermarkCodec::new(WatermarkOptions {
            strength: 20,
            ..WatermarkOptions::default()
        });
        let results = codec.embed_directory(&input, &output);
        assert_eq!(results.len(), 2);

        let written: Vec<_> = results.iter().filter(|r| r.success).collect();
        let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(written.len(), 1);
        assert_eq!(failed.len(), 1);
        assert_eq!(written[0].path, input.join("photo.jpg"));
        assert_eq!(failed[0].path, input.join("photo.png"));
        assert!(failed[0].output.is_none());
        assert!(failed[0].message.contains("photo_watermarked.png"));

        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 1);
    }

    #[test]
    fn embed_directory_skips_unsupported_files() {
        let dir = temp_dir("skip");
        let input = dir.join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("notes.txt"), b"hello").unwrap();
        GrayImage::from_pixel(8, 8, image::Luma([60]))
            .save(input.join("a.png"))
            .unwrap();

        let results = WatermarkCodec::default().embed_directory(&input, &dir.join("out"));
        assert_eq!(results.len(), 2);

        let skipped: Vec<_> = results.iter().filter(|r| r.skipped).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, input.join("notes.txt"));
        assert!(skipped[0].success);
        assert!(results.iter().any(|r| !r.skipped && r.success));
    }
}
