//! Error types for the `framesift` crate.
//!
//! This module defines [`FrameSiftError`], the unified error type returned by
//! all fallible operations in the crate. Input errors (missing video, bad
//! configuration, unsupported upload) surface before any decoding starts;
//! run-level errors abort an extraction and leave already-written frames on
//! disk.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `framesift` operations.
///
/// Every public function that can fail returns `Result<T, FrameSiftError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameSiftError {
    /// The video path does not exist. Checked before any decode attempt.
    #[error("Video file not found: {}", path.display())]
    VideoNotFound {
        /// Path that was passed to the extraction call.
        path: PathBuf,
    },

    /// The video container could not be opened.
    #[error("Failed to open video file at {}: {reason}", path.display())]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container does not carry a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A configuration value is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An uploaded file has an extension outside the allow-list.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while loading or saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The OCR engine failed. The text filter treats this as "no text".
    #[error("OCR failed: {0}")]
    OcrError(String),

    /// A background extraction panicked before producing a result.
    #[error("Extraction panicked: {0}")]
    TaskPanicked(String),

    /// No task is registered under the given identifier.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// The task exists but has not completed successfully.
    #[error("Task {0} has not completed")]
    TaskNotCompleted(String),

    /// Writing the zip archive failed.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// A requested archive entry is not a frame in the output directory.
    #[error("Invalid archive entry: {0}")]
    InvalidArchiveEntry(String),
}

impl From<FfmpegError> for FrameSiftError {
    fn from(error: FfmpegError) -> Self {
        FrameSiftError::FfmpegError(error.to_string())
    }
}

impl From<ZipError> for FrameSiftError {
    fn from(error: ZipError) -> Self {
        FrameSiftError::ArchiveError(error.to_string())
    }
}
