//! Headless workflow state machine for interactive front ends.
//!
//! Mirrors the load / generate / save / test flow of a watermarking tool:
//!
//! ```text
//! NoImage --load--> ImageLoaded --generate--> WatermarkGenerated
//!                        ^                        |  ^   |
//!                        +---------load-----------+  +---+ generate, save, test
//! ```
//!
//! Rejected actions leave the session untouched.

use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::detection::Detection;
use crate::engine::{self, WatermarkCodec};
use crate::error::{Error, Result};

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded yet.
    NoImage,
    /// An image is loaded but not watermarked.
    ImageLoaded,
    /// A watermarked buffer is ready to save or test.
    WatermarkGenerated,
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            Self::NoImage => "no image loaded",
            Self::ImageLoaded => "no watermark generated",
            Self::WatermarkGenerated => "watermark generated",
        }
    }
}

/// One user's pass through the load / generate / save / test workflow.
#[derive(Debug)]
pub struct Session {
    codec: WatermarkCodec,
    source: Option<(PathBuf, GrayImage)>,
    watermarked: Option<GrayImage>,
}

impl Session {
    /// Start an empty session.
    #[must_use]
    pub fn new(codec: WatermarkCodec) -> Self {
        Self {
            codec,
            source: None,
            watermarked: None,
        }
    }

    /// Current workflow state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match (&self.source, &self.watermarked) {
            (None, _) => SessionState::NoImage,
            (Some(_), None) => SessionState::ImageLoaded,
            (Some(_), Some(_)) => SessionState::WatermarkGenerated,
        }
    }

    /// The watermarked buffer, once generated.
    #[must_use]
    pub fn watermarked(&self) -> Option<&GrayImage> {
        self.watermarked.as_ref()
    }

    /// Load a source image, discarding any previous watermark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageDecode`] if the file cannot be decoded; the
    /// session keeps its previous image in that case.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let image = engine::load_gray(path)?;
        self.source = Some((path.to_path_buf(), image));
        self.watermarked = None;
        Ok(())
    }

    /// Embed the watermark into the loaded image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when no image is loaded.
    pub fn generate(&mut self) -> Result<&GrayImage> {
        let (_, source) = self.source.as_ref().ok_or_else(|| self.reject("generate"))?;
        let watermarked = self.codec.embed(source)?;
        Ok(&*self.watermarked.insert(watermarked))
    }

    /// Save the watermarked buffer as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] before a watermark is generated,
    /// or the save error.
    pub fn save(&self, path: &Path) -> Result<()> {
        let watermarked = self.watermarked.as_ref().ok_or_else(|| self.reject("save"))?;
        engine::save_image(watermarked, path)
    }

    /// Compare the watermarked buffer against the source file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] before a watermark is generated,
    /// or [`Error::ImageDecode`] if the source file has become unreadable.
    pub fn test(&self) -> Result<Detection> {
        match (&self.source, &self.watermarked) {
            (Some((path, _)), Some(watermarked)) => self.codec.detect_path(path, watermarked),
            _ => Err(self.reject("test")),
        }
    }

    fn reject(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state().describe(),
        }
    }
}
