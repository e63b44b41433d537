//! Error types for the seeded-watermark crate.

/// Errors that can occur while generating, embedding, or detecting a watermark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Width or height is zero.
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Pattern strength must be at least 1.
    #[error("invalid strength {0}: must be at least 1")]
    InvalidStrength(u8),

    /// A pattern and an image disagree on shape.
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        /// Dimensions of the image being watermarked.
        expected: (u32, u32),
        /// Dimensions of the supplied pattern.
        actual: (u32, u32),
    },

    /// The input file could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    ImageDecode(image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A session action was attempted in a state that does not allow it.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// The rejected action.
        action: &'static str,
        /// The session state at the time.
        state: &'static str,
    },
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
