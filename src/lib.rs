//! Embed and detect a seeded, invisible additive watermark in grayscale images.
//!
//! A pseudo-random `+k`/`-k` pattern, derived from the image size and a seed,
//! is added to every pixel with saturation. Detection compares a candidate
//! against the unmodified original and flags it when any pixel differs by more
//! than a fixed threshold (15). This is a single-bit marker with no
//! cryptographic or robustness guarantees.
//!
//! # Quick Start
//!
//! ```no_run
//! use seeded_watermark::{WatermarkCodec, WatermarkOptions};
//!
//! let codec = WatermarkCodec::new(WatermarkOptions { strength: 20, ..Default::default() });
//! let original = image::open("photo.png").unwrap().to_luma8();
//! let marked = codec.embed(&original).unwrap();
//! marked.save("photo_watermarked.png").unwrap();
//! ```
//!
//! # Detection
//!
//! ```no_run
//! use seeded_watermark::WatermarkCodec;
//!
//! let codec = WatermarkCodec::default();
//! let original = image::open("photo.png").unwrap().to_luma8();
//! let candidate = image::open("suspect.png").unwrap().to_luma8();
//! let result = codec.detect(&original, &candidate).unwrap();
//! println!("{result} (max difference {})", result.max_difference);
//! ```

#![deny(missing_docs)]

pub mod detection;
pub mod embedding;
mod engine;
pub mod error;
pub mod pattern;
pub mod session;

pub use detection::{detect, Detection, DETECTION_THRESHOLD};
pub use embedding::embed;
pub use engine::{
    default_output_path, is_supported_image, load_gray, save_image, ProcessOptions,
    ProcessResult, WatermarkCodec, WatermarkOptions, DEFAULT_SEED, DEFAULT_STRENGTH,
};
pub use error::{Error, Result};
pub use pattern::{generate_pattern, Pattern};
pub use session::{Session, SessionState};
