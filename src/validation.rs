//! Input validation for uploaded videos.
//!
//! A service layer accepting uploads runs three checks before submitting a
//! task: the file extension is on the allow-list ([`is_supported_video`]),
//! the client-supplied name is made safe to store ([`sanitize_filename`]),
//! and the stored file is probed for obvious problems ([`validate_video`]).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = framesift::validation::validate_video(Path::new("uploads/talk.mp4"))?;
//! if report.is_valid() {
//!     println!("File is valid");
//! } else {
//!     for error in &report.errors {
//!         println!("Error: {error}");
//!     }
//! }
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    time::Duration,
};

use crate::{error::FrameSiftError, metadata::VideoMetadata, video::VideoFile};

/// Video file extensions accepted for upload, lower case.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Whether `file_name` ends in an allowed video extension (case-insensitive).
///
/// ```
/// use framesift::validation::is_supported_video;
///
/// assert!(is_supported_video("Lecture 3.MP4"));
/// assert!(!is_supported_video("notes.pdf"));
/// assert!(!is_supported_video("mp4"));
/// ```
pub fn is_supported_video(file_name: &str) -> bool {
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| extension.eq_ignore_ascii_case(allowed))
}

/// Like [`is_supported_video`], as a `Result`.
///
/// # Errors
///
/// [`FrameSiftError::UnsupportedFormat`] naming the rejected file.
pub fn ensure_supported_video(file_name: &str) -> Result<(), FrameSiftError> {
    if is_supported_video(file_name) {
        Ok(())
    } else {
        Err(FrameSiftError::UnsupportedFormat(format!(
            "{file_name} (allowed: {})",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Reduce a client-supplied file name to a safe, flat name.
///
/// Path separators and whitespace become `_`, characters other than ASCII
/// letters, digits, `_`, `-` and `.` are dropped, and leading or trailing
/// dots and underscores are trimmed. The result can be empty; callers must
/// then pick a name of their own.
///
/// ```
/// use framesift::validation::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My Talk (final).mp4"), "My_Talk_final.mp4");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut pending_separator = false;

    for character in name.chars() {
        if character.is_whitespace() || character == '/' || character == '\\' {
            pending_separator = true;
        } else if character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.') {
            if pending_separator && !cleaned.is_empty() {
                cleaned.push('_');
            }
            pending_separator = false;
            cleaned.push(character);
        }
    }

    cleaned.trim_matches(['.', '_']).to_string()
}

/// Findings about a video file.
///
/// Produced by [`validate_video`] and [`validate_metadata`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect extraction.
    pub warnings: Vec<String>,
    /// Issues that will prevent a useful extraction.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check extracted stream metadata for problems.
pub fn validate_metadata(metadata: &VideoMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}x{}",
            metadata.width, metadata.height,
        ));
    }

    if metadata.frames_per_second <= 0.0 {
        report.warnings.push(
            "Frame rate is unknown; every frame will be sampled regardless of interval"
                .to_string(),
        );
    } else if metadata.frames_per_second > 240.0 {
        report.warnings.push(format!(
            "Unusually high frame rate ({:.1} fps); extraction may be slow",
            metadata.frames_per_second,
        ));
    }

    if metadata.duration == Duration::ZERO {
        report
            .warnings
            .push("Container reports no duration".to_string());
    }

    if metadata.frame_count == 0 {
        report
            .warnings
            .push("Frame count is unknown; progress will stay at 0%".to_string());
    }

    report.info.push(format!(
        "Video: {} {}x{} @ {:.2} fps, ~{} frames, {:.1}s [{}]",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.frame_count,
        metadata.duration.as_secs_f64(),
        metadata.format,
    ));

    report
}

/// Open the video at `path` and report on its suitability for extraction.
///
/// An extension outside [`ALLOWED_EXTENSIONS`] is reported as an error but
/// the file is still probed.
///
/// # Errors
///
/// [`FrameSiftError::VideoNotFound`], [`FrameSiftError::FileOpen`] or
/// [`FrameSiftError::NoVideoStream`] if the file cannot be opened as a
/// video at all.
pub fn validate_video(path: &Path) -> Result<ValidationReport, FrameSiftError> {
    let video = VideoFile::open(path)?;
    let mut report = validate_metadata(video.metadata());

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_supported_video(&name) {
        report.errors.push(format!(
            "Extension of {name:?} is not one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ));
    }

    Ok(report)
}
