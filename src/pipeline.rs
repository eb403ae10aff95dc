//! The frame-selection pipeline.
//!
//! For every decoded frame the pipeline advances a scan counter; for every
//! *sampled* frame it runs, in order:
//!
//! 1. the duplicate filter against all frames kept so far in this run,
//! 2. the sharpness and contrast checks,
//! 3. the OCR text check (only when text is required),
//!
//! and writes the frame to disk if it passes all three. The first failing
//! stage classifies the frame; later stages are not run. Each sampled frame
//! lands in exactly one counter, so
//! `saved + skipped + quality_filtered + text_filtered == sampled_frames`.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use image::RgbImage;
use serde_json::{Value, json};

use crate::{
    configuration::ExtractionConfig,
    error::FrameSiftError,
    luma::luminance,
    output::FrameWriter,
    progress::{ProgressSnapshot, ProgressTracker},
    quality::{QualityFilter, QualityScores},
    sampler::{FrameSampler, FrameSource},
    similarity::DuplicateFilter,
    text::TextFilter,
    video::VideoFile,
};

/// Classification of one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameVerdict {
    /// Passed every filter and was written to `path`.
    Saved {
        path: PathBuf,
    },
    /// Too similar to an already-kept frame.
    Duplicate {
        /// Acceptance-order index of the kept frame it matched.
        kept_index: usize,
        similarity: f64,
    },
    /// Blurry, transitional, or washed out.
    LowQuality {
        sharpness: f64,
        contrast: f64,
    },
    /// OCR found no text (or failed).
    NoText,
}

impl Display for FrameVerdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FrameVerdict::Saved { path } => {
                let name = path.file_name().unwrap_or(path.as_os_str());
                write!(f, "saved -> {}", name.to_string_lossy())
            }
            FrameVerdict::Duplicate { similarity, .. } => {
                write!(f, "similarity {similarity:.3}, skipped")
            }
            FrameVerdict::LowQuality {
                sharpness,
                contrast,
            } => write!(
                f,
                "low quality (sharpness {sharpness:.1}, contrast {contrast:.1}), skipped"
            ),
            FrameVerdict::NoText => write!(f, "no text detected, skipped"),
        }
    }
}

/// Summary of a completed extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Decoded frames scanned, sampled or not.
    pub total_frames: u64,
    /// Frames examined by the filters.
    pub sampled_frames: u64,
    pub saved_count: u64,
    /// Rejected as duplicates.
    pub skipped_count: u64,
    pub quality_filtered: u64,
    pub text_filtered: u64,
    pub output_dir: PathBuf,
}

impl ExtractionResult {
    /// Render the summary with the field names used by the status payload.
    pub fn to_json(&self) -> Value {
        json!({
            "total_frames": self.total_frames,
            "sampled_frames": self.sampled_frames,
            "saved_count": self.saved_count,
            "skipped_count": self.skipped_count,
            "quality_filtered": self.quality_filtered,
            "text_filtered": self.text_filtered,
            "output_dir": self.output_dir.display().to_string(),
        })
    }
}

/// Per-run filter state.
pub(crate) struct FrameSelector {
    duplicates: DuplicateFilter,
    quality: QualityFilter,
    text: Option<TextFilter>,
}

impl FrameSelector {
    pub(crate) fn new(config: &ExtractionConfig) -> Self {
        Self {
            duplicates: DuplicateFilter::new(config.similarity_threshold),
            quality: QualityFilter::new(config.sharpness_threshold, config.contrast_threshold),
            text: config.require_text.then(|| {
                TextFilter::new(config.recognizer.clone(), config.text_languages.clone())
            }),
        }
    }

    /// Classify `frame`, writing it through `writer` if it is kept.
    pub(crate) fn select(
        &mut self,
        frame: &RgbImage,
        writer: &mut FrameWriter,
    ) -> Result<FrameVerdict, FrameSiftError> {
        let luma = luminance(frame);

        if let Some(found) = self.duplicates.find_duplicate(&luma) {
            return Ok(FrameVerdict::Duplicate {
                kept_index: found.kept_index,
                similarity: found.similarity,
            });
        }

        let scores = QualityScores::measure(&luma);
        if !self.quality.accepts(&scores) {
            return Ok(FrameVerdict::LowQuality {
                sharpness: scores.sharpness,
                contrast: scores.contrast,
            });
        }

        if let Some(text) = &self.text {
            if !text.has_text(frame) {
                return Ok(FrameVerdict::NoText);
            }
        }

        let path = writer.write(frame)?;
        self.duplicates.remember(luma);
        Ok(FrameVerdict::Saved { path })
    }
}

/// Extract distinct, legible frames from the video at `video_path` into
/// `output_dir`.
///
/// Checks run in this order, and nothing is created on disk until all of
/// them pass: configuration ranges, video existence, container open.
///
/// # Errors
///
/// - [`FrameSiftError::InvalidParameter`] for out-of-range configuration.
/// - [`FrameSiftError::VideoNotFound`] if `video_path` does not exist.
/// - [`FrameSiftError::FileOpen`] / [`FrameSiftError::NoVideoStream`] if the
///   container cannot be used.
/// - Any decode or write error during the run. Frames written before the
///   error stay on disk.
///
/// # Example
///
/// ```no_run
/// use framesift::ExtractionConfig;
///
/// let config = ExtractionConfig::new().with_text_languages("eng");
/// let result = framesift::extract_frames("slides.mp4", "out/slides", &config)?;
/// println!(
///     "{} saved, {} duplicates, {} blurry, {} without text",
///     result.saved_count, result.skipped_count, result.quality_filtered, result.text_filtered,
/// );
/// # Ok::<(), framesift::FrameSiftError>(())
/// ```
pub fn extract_frames<P, Q>(
    video_path: P,
    output_dir: Q,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FrameSiftError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    config.validate()?;

    let video_path = video_path.as_ref();
    if !video_path.exists() {
        return Err(FrameSiftError::VideoNotFound {
            path: video_path.to_path_buf(),
        });
    }

    let mut video = VideoFile::open(video_path)?;
    extract_frames_from(&mut video, output_dir, config)
}

/// Run the pipeline over any [`FrameSource`].
///
/// # Errors
///
/// As [`extract_frames`], minus the file-opening conditions.
pub fn extract_frames_from<Q: AsRef<Path>>(
    source: &mut dyn FrameSource,
    output_dir: Q,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FrameSiftError> {
    config.validate()?;

    let sampler = FrameSampler::new(source.frames_per_second(), config.interval_seconds);
    let mut writer = FrameWriter::create(output_dir)?;
    let mut selector = FrameSelector::new(config);
    let mut tracker = ProgressTracker::new(config.progress.clone(), config.progress_batch);

    log::info!(
        "Extracting into {}: {} frames @ {:.2} fps, every {} frame(s), similarity {}, sharpness {}, contrast {}, text {}",
        writer.directory().display(),
        source.total_frames(),
        source.frames_per_second(),
        sampler.frame_interval().max(1),
        config.similarity_threshold,
        config.sharpness_threshold,
        config.contrast_threshold,
        if config.require_text {
            config.text_languages.as_str()
        } else {
            "off"
        },
    );

    let mut counts = ProgressSnapshot {
        total_frames: source.total_frames(),
        ..ProgressSnapshot::default()
    };
    let mut sampled_frames = 0;
    let mut index = 0;

    while let Some(frame) = source.next_frame()? {
        if sampler.is_sampled(index) {
            sampled_frames += 1;
            let verdict = selector.select(&frame, &mut writer)?;
            match &verdict {
                FrameVerdict::Saved { .. } => counts.saved_count += 1,
                FrameVerdict::Duplicate { .. } => counts.skipped_count += 1,
                FrameVerdict::LowQuality { .. } => counts.quality_filtered += 1,
                FrameVerdict::NoText => counts.text_filtered += 1,
            }
            log::debug!("Frame {index}: {verdict}");
            tracker.frame(index, &verdict);
        }

        index += 1;
        counts.scanned_frames = index;
        tracker.advance(&counts);
    }

    tracker.finish(&counts);

    let result = ExtractionResult {
        total_frames: counts.scanned_frames,
        sampled_frames,
        saved_count: counts.saved_count,
        skipped_count: counts.skipped_count,
        quality_filtered: counts.quality_filtered,
        text_filtered: counts.text_filtered,
        output_dir: writer.directory().to_path_buf(),
    };

    log::info!(
        "Extraction finished: {} scanned, {} sampled, {} saved, {} duplicates, {} low quality, {} without text",
        result.total_frames,
        result.sampled_frames,
        result.saved_count,
        result.skipped_count,
        result.quality_filtered,
        result.text_filtered,
    );

    Ok(result)
}
