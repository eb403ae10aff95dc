//! # framesift
//!
//! Pull the distinct, legible frames out of a lecture or slide-deck video.
//!
//! `framesift` decodes a video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), samples one frame
//! per time interval, and keeps a sampled frame only if it
//!
//! 1. is not a near-duplicate (SSIM) of any frame already kept,
//! 2. is sharp and contrasty enough (Laplacian variance, luminance
//!    standard deviation), and
//! 3. optionally, contains text according to an OCR engine.
//!
//! Kept frames are written as `frame_0001.png`, `frame_0002.png`, … and a
//! per-category summary is returned.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesift::ExtractionConfig;
//!
//! let config = ExtractionConfig::new()
//!     .with_interval(2.0)
//!     .with_text_languages("eng");
//! let result = framesift::extract_frames("lecture.mp4", "frames/lecture", &config)?;
//! println!("{} slides kept of {} sampled", result.saved_count, result.sampled_frames);
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```
//!
//! ### Watching Progress
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesift::{ExtractionConfig, FnProgress, ProgressSnapshot};
//!
//! let config = ExtractionConfig::new().with_progress(Arc::new(FnProgress(
//!     |snapshot: &ProgressSnapshot| println!("{}%", snapshot.percentage()),
//! )));
//! framesift::extract_frames("lecture.mp4", "frames", &config)?;
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```
//!
//! ### Background Tasks
//!
//! A service accepting uploads submits each video to a [`TaskStore`] and
//! polls it; see the [`task`] module.
//!
//! ## Features
//!
//! - **Interval sampling**: one frame per N seconds of video
//! - **Duplicate suppression**: SSIM against every kept frame
//! - **Quality filter**: rejects blurry, transitional and washed-out frames
//! - **Text filter**: Tesseract OCR, or any [`TextRecognizer`]
//! - **Progress reporting**: batched callbacks with per-category counts
//! - **Page-turn review**: [`is_page_turn_image`] flags transition frames
//! - **Packaging**: zip archives of kept frames
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build. The default
//! text filter runs the `tesseract` executable, which must be on `PATH`
//! with the requested language data installed.

pub mod archive;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod luma;
pub mod metadata;
pub mod output;
pub mod page_turn;
pub mod pipeline;
pub mod progress;
pub mod quality;
pub mod sampler;
pub mod similarity;
pub mod task;
pub mod text;
mod utilities;
pub mod validation;
pub mod video;

pub use archive::write_archive;
pub use configuration::ExtractionConfig;
pub use error::FrameSiftError;
pub use ffmpeg::{FfmpegLogLevel, ffmpeg_log_level, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use page_turn::{PageTurnOptions, is_page_turn_image, is_page_turn_image_with_options};
pub use pipeline::{ExtractionResult, FrameVerdict, extract_frames, extract_frames_from};
pub use progress::{ChannelProgress, FnProgress, ProgressCallback, ProgressSnapshot};
pub use quality::{QualityFilter, QualityScores};
pub use sampler::{FrameSampler, FrameSource, MemorySource};
pub use similarity::{DuplicateFilter, ssim, structural_similarity};
pub use task::{TaskHandle, TaskSnapshot, TaskStatus, TaskStore};
pub use text::{TesseractCli, TextFilter, TextRecognizer};
pub use validation::{ValidationReport, is_supported_video, sanitize_filename};
pub use video::VideoFile;
