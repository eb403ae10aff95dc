//! Text-presence detection.
//!
//! OCR is delegated to an external engine behind the [`TextRecognizer`]
//! trait. The default engine, [`TesseractCli`], pipes each frame as PNG into
//! the `tesseract` command-line tool using page-segmentation mode 6 (a single
//! uniform block of text).
//!
//! [`TextFilter`] turns recognition into an accept/reject decision. Engine
//! failures are logged and treated as "no text": a frame whose OCR fails is
//! rejected, and the run carries on.

use std::{
    ffi::OsString,
    io::{Cursor, Write},
    process::{Command, Stdio},
    sync::Arc,
};

use image::{ImageFormat, RgbImage};

use crate::error::FrameSiftError;

/// An OCR engine.
///
/// Implementations must be [`Send`] and [`Sync`]; a single engine may serve
/// several concurrent extraction runs.
pub trait TextRecognizer: Send + Sync {
    /// Recognise the text in `frame`.
    ///
    /// `languages` is a `+`-separated language list such as `"chi_sim+eng"`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameSiftError::OcrError`] when the engine cannot run or
    /// rejects the input.
    fn recognize(&self, frame: &RgbImage, languages: &str) -> Result<String, FrameSiftError>;
}

/// Default page-segmentation mode: assume a single uniform block of text.
pub const DEFAULT_PAGE_SEGMENTATION_MODE: u8 = 6;

/// Runs the `tesseract` binary once per frame.
///
/// The frame is encoded as PNG and written to the child's stdin; recognised
/// text is read from its stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: OsString,
    page_segmentation_mode: u8,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// Use `tesseract` from `PATH` with page-segmentation mode 6.
    pub fn new() -> Self {
        Self {
            binary: OsString::from("tesseract"),
            page_segmentation_mode: DEFAULT_PAGE_SEGMENTATION_MODE,
        }
    }

    /// Use a specific `tesseract` executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<OsString>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Override the page-segmentation mode (`--psm`).
    #[must_use]
    pub fn with_page_segmentation_mode(mut self, mode: u8) -> Self {
        self.page_segmentation_mode = mode;
        self
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, frame: &RgbImage, languages: &str) -> Result<String, FrameSiftError> {
        let mut png = Cursor::new(Vec::new());
        frame
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|error| FrameSiftError::OcrError(format!("PNG encoding failed: {error}")))?;

        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                FrameSiftError::OcrError(format!(
                    "failed to start {}: {error}",
                    self.binary.to_string_lossy()
                ))
            })?;

        // Assumes tesseract reads the whole image before it writes more than
        // a pipe buffer of stdout or stderr.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(png.get_ref()),
            None => Ok(()),
        };

        // Always reap the child, even when it stopped reading early.
        let output = child
            .wait_with_output()
            .map_err(|error| FrameSiftError::OcrError(error.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameSiftError::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written.map_err(|error| FrameSiftError::OcrError(format!("writing image: {error}")))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Accept/reject decision on OCR output.
#[derive(Clone)]
pub struct TextFilter {
    recognizer: Arc<dyn TextRecognizer>,
    languages: String,
}

impl TextFilter {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, languages: impl Into<String>) -> Self {
        Self {
            recognizer,
            languages: languages.into(),
        }
    }

    /// Returns `true` when the recognised text is non-empty after trimming.
    ///
    /// Recognition errors count as "no text".
    pub fn has_text(&self, frame: &RgbImage) -> bool {
        match self.recognizer.recognize(frame, &self.languages) {
            Ok(text) => !text.trim().is_empty(),
            Err(error) => {
                log::warn!("OCR failed, treating frame as text-free: {error}");
                false
            }
        }
    }
}
