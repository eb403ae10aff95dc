//! Extraction configuration.
//!
//! [`ExtractionConfig`] is a builder that carries the filter thresholds,
//! the OCR settings, and the progress observer through an extraction run
//! without growing every function signature.
//!
//! # Example
//!
//! ```no_run
//! use framesift::ExtractionConfig;
//!
//! let config = ExtractionConfig::new()
//!     .with_interval(0.5)
//!     .with_similarity_threshold(0.9)
//!     .with_sharpness_threshold(100.0)
//!     .with_require_text(false);
//! let summary = framesift::extract_frames("talk.mp4", "frames", &config)?;
//! println!("kept {} frames", summary.saved_count);
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::FrameSiftError;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::text::{TesseractCli, TextRecognizer};

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: f64 = 1.0;
/// Default SSIM score at or above which a candidate counts as a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.95;
/// Default minimum Laplacian variance.
pub const DEFAULT_SHARPNESS_THRESHOLD: f64 = 150.0;
/// Default minimum luminance standard deviation.
pub const DEFAULT_CONTRAST_THRESHOLD: f64 = 20.0;
/// Default Tesseract language string.
pub const DEFAULT_TEXT_LANGUAGES: &str = "chi_sim+eng";
/// Progress is reported after this many scanned frames.
pub const DEFAULT_PROGRESS_BATCH: u64 = 10;

/// Immutable parameters of one extraction run.
///
/// All fields have defaults; see the `DEFAULT_*` constants. Values are
/// checked by [`validate`](ExtractionConfig::validate), which
/// [`extract_frames`](crate::extract_frames) calls before touching the
/// file system.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) interval_seconds: f64,
    pub(crate) similarity_threshold: f64,
    pub(crate) sharpness_threshold: f64,
    pub(crate) contrast_threshold: f64,
    pub(crate) require_text: bool,
    pub(crate) text_languages: String,
    pub(crate) recognizer: Arc<dyn TextRecognizer>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) progress_batch: u64,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("interval_seconds", &self.interval_seconds)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("sharpness_threshold", &self.sharpness_threshold)
            .field("contrast_threshold", &self.contrast_threshold)
            .field("require_text", &self.require_text)
            .field("text_languages", &self.text_languages)
            .field("progress_batch", &self.progress_batch)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            sharpness_threshold: DEFAULT_SHARPNESS_THRESHOLD,
            contrast_threshold: DEFAULT_CONTRAST_THRESHOLD,
            require_text: true,
            text_languages: DEFAULT_TEXT_LANGUAGES.to_string(),
            recognizer: Arc::new(TesseractCli::new()),
            progress: Arc::new(NoOpProgress),
            progress_batch: DEFAULT_PROGRESS_BATCH,
        }
    }

    /// Seconds of video between sampled frames. Must be positive.
    #[must_use]
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// SSIM score in `[0, 1]` at or above which a candidate is a duplicate.
    ///
    /// Values closer to 1 keep more frames.
    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Minimum Laplacian variance a frame needs to count as sharp.
    #[must_use]
    pub fn with_sharpness_threshold(mut self, threshold: f64) -> Self {
        self.sharpness_threshold = threshold;
        self
    }

    /// Minimum luminance standard deviation a frame needs.
    #[must_use]
    pub fn with_contrast_threshold(mut self, threshold: f64) -> Self {
        self.contrast_threshold = threshold;
        self
    }

    /// Whether frames must contain OCR-recognisable text to be kept.
    #[must_use]
    pub fn with_require_text(mut self, require: bool) -> Self {
        self.require_text = require;
        self
    }

    /// Tesseract language string, e.g. `"eng"` or `"chi_sim+eng"`.
    #[must_use]
    pub fn with_text_languages(mut self, languages: impl Into<String>) -> Self {
        self.text_languages = languages.into();
        self
    }

    /// Replace the OCR engine used by the text filter.
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Attach a progress observer.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how many scanned frames pass between progress reports.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_progress_batch(mut self, frames: u64) -> Self {
        self.progress_batch = frames.max(1);
        self
    }

    pub fn interval_seconds(&self) -> f64 {
        self.interval_seconds
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn sharpness_threshold(&self) -> f64 {
        self.sharpness_threshold
    }

    pub fn contrast_threshold(&self) -> f64 {
        self.contrast_threshold
    }

    pub fn require_text(&self) -> bool {
        self.require_text
    }

    pub fn text_languages(&self) -> &str {
        &self.text_languages
    }

    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// Returns [`FrameSiftError::InvalidParameter`] naming the first value
    /// that is out of range.
    pub fn validate(&self) -> Result<(), FrameSiftError> {
        if !self.interval_seconds.is_finite() || self.interval_seconds <= 0.0 {
            return Err(FrameSiftError::InvalidParameter(format!(
                "interval must be greater than zero (got {})",
                self.interval_seconds
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(FrameSiftError::InvalidParameter(format!(
                "similarity threshold must be within [0, 1] (got {})",
                self.similarity_threshold
            )));
        }
        if !self.sharpness_threshold.is_finite() || self.sharpness_threshold < 0.0 {
            return Err(FrameSiftError::InvalidParameter(format!(
                "sharpness threshold must be non-negative (got {})",
                self.sharpness_threshold
            )));
        }
        if !self.contrast_threshold.is_finite() || self.contrast_threshold < 0.0 {
            return Err(FrameSiftError::InvalidParameter(format!(
                "contrast threshold must be non-negative (got {})",
                self.contrast_threshold
            )));
        }
        if self.require_text && self.text_languages.trim().is_empty() {
            return Err(FrameSiftError::InvalidParameter(
                "text language string must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval_seconds(), 1.0);
        assert_eq!(config.similarity_threshold(), 0.95);
        assert!(config.require_text());
        assert_eq!(config.text_languages(), "chi_sim+eng");
    }

    #[test]
    fn rejects_non_positive_interval() {
        for interval in [0.0, -1.0, f64::NAN] {
            let config = ExtractionConfig::new().with_interval(interval);
            assert!(matches!(
                config.validate(),
                Err(FrameSiftError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn rejects_similarity_outside_unit_range() {
        assert!(ExtractionConfig::new().with_similarity_threshold(1.01).validate().is_err());
        assert!(ExtractionConfig::new().with_similarity_threshold(-0.1).validate().is_err());
        assert!(ExtractionConfig::new().with_similarity_threshold(0.0).validate().is_ok());
        assert!(ExtractionConfig::new().with_similarity_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn rejects_negative_quality_thresholds() {
        assert!(ExtractionConfig::new().with_sharpness_threshold(-1.0).validate().is_err());
        assert!(ExtractionConfig::new().with_contrast_threshold(-1.0).validate().is_err());
    }

    #[test]
    fn empty_languages_only_matter_when_text_required() {
        let config = ExtractionConfig::new().with_text_languages("  ");
        assert!(config.validate().is_err());
        assert!(config.with_require_text(false).validate().is_ok());
    }

    #[test]
    fn progress_batch_is_clamped() {
        let config = ExtractionConfig::new().with_progress_batch(0);
        assert_eq!(config.progress_batch, 1);
    }
}
