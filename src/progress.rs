//! Progress reporting for extraction runs.
//!
//! The pipeline reports its six running counters through a
//! [`ProgressCallback`] every few scanned frames and once more at end of
//! stream. Observers receive a borrowed [`ProgressSnapshot`]; they cannot
//! mutate pipeline state and must return quickly, since they run on the
//! extraction thread.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesift::{ExtractionConfig, ProgressCallback, ProgressSnapshot};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, snapshot: &ProgressSnapshot) {
//!         println!(
//!             "{}% ({} saved, {} duplicates)",
//!             snapshot.percentage(),
//!             snapshot.saved_count,
//!             snapshot.skipped_count,
//!         );
//!     }
//! }
//!
//! let config = ExtractionConfig::new().with_progress(Arc::new(PrintProgress));
//! let summary = framesift::extract_frames("lecture.mp4", "frames", &config)?;
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::sync::{Arc, mpsc::SyncSender};

use serde_json::{Value, json};

use crate::pipeline::FrameVerdict;

/// Running counters of an extraction run.
///
/// Emitted repeatedly while the run progresses. The final snapshot carries
/// the same counts as the returned [`ExtractionResult`](crate::ExtractionResult).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Decoded frames seen so far, sampled or not.
    pub scanned_frames: u64,
    /// Frame count reported by the container. Zero when unknown.
    pub total_frames: u64,
    /// Frames written to the output directory.
    pub saved_count: u64,
    /// Sampled frames rejected as near-duplicates of a kept frame.
    pub skipped_count: u64,
    /// Sampled frames rejected for blur or low contrast.
    pub quality_filtered: u64,
    /// Sampled frames rejected because OCR found no text.
    pub text_filtered: u64,
}

impl ProgressSnapshot {
    /// Whole-number completion percentage derived from scanned / total.
    ///
    /// Returns 0 when the total is unknown. Container frame counts are
    /// estimates, so the value is clamped to 100.
    pub fn percentage(&self) -> u8 {
        if self.total_frames == 0 {
            return 0;
        }
        let percent = self.scanned_frames.saturating_mul(100) / self.total_frames;
        percent.min(100) as u8
    }

    /// Render the snapshot with the field names used by the status payload.
    pub fn to_json(&self) -> Value {
        json!({
            "frame_count": self.scanned_frames,
            "total_frames": self.total_frames,
            "saved_count": self.saved_count,
            "skipped_count": self.skipped_count,
            "quality_filtered": self.quality_filtered,
            "text_filtered": self.text_filtered,
            "percentage": self.percentage(),
        })
    }
}

/// Trait for observing an extraction run.
///
/// Implementations must be [`Send`] and [`Sync`]: the pipeline usually runs
/// on a background worker thread while the observer is shared with the
/// thread that polls for status.
///
/// Callbacks are **infallible** and must not block; they observe but cannot
/// influence the run.
pub trait ProgressCallback: Send + Sync {
    /// Called every N scanned frames and once at end of stream.
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// Called once per sampled frame with its classification.
    fn on_frame(&self, _frame_index: u64, _verdict: &FrameVerdict) {}
}

/// A no-op implementation that discards all notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
}

/// Adapts a closure into a [`ProgressCallback`].
///
/// ```
/// use std::sync::Arc;
///
/// use framesift::{ExtractionConfig, FnProgress};
///
/// let config = ExtractionConfig::new().with_progress(Arc::new(FnProgress(|snapshot: &framesift::ProgressSnapshot| {
///     eprintln!("{} frames scanned", snapshot.scanned_frames);
/// })));
/// ```
pub struct FnProgress<F>(pub F);

impl<F> ProgressCallback for FnProgress<F>
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        (self.0)(snapshot);
    }
}

/// Forwards snapshots into a bounded channel without ever blocking.
///
/// When the channel is full the snapshot is dropped; the consumer will see
/// a later one. A disconnected receiver is ignored as well.
///
/// ```
/// use std::sync::{Arc, mpsc};
///
/// use framesift::{ChannelProgress, ExtractionConfig};
///
/// let (sender, receiver) = mpsc::sync_channel(16);
/// let config = ExtractionConfig::new().with_progress(Arc::new(ChannelProgress::new(sender)));
/// # drop(receiver);
/// ```
#[derive(Debug)]
pub struct ChannelProgress {
    sender: SyncSender<ProgressSnapshot>,
}

impl ChannelProgress {
    /// Wrap the sending half of a `std::sync::mpsc::sync_channel`.
    pub fn new(sender: SyncSender<ProgressSnapshot>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        let _ = self.sender.try_send(*snapshot);
    }
}

/// Internal helper that decides when to emit callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    batch_size: u64,
    frames_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, batch_size: u64) -> Self {
        Self {
            callback,
            batch_size: batch_size.max(1),
            frames_since_last_report: 0,
        }
    }

    /// Record one scanned frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, snapshot: &ProgressSnapshot) {
        self.frames_since_last_report += 1;

        if self.frames_since_last_report >= self.batch_size {
            self.callback.on_progress(snapshot);
            self.frames_since_last_report = 0;
        }
    }

    pub(crate) fn frame(&self, frame_index: u64, verdict: &FrameVerdict) {
        self.callback.on_frame(frame_index, verdict);
    }

    /// Unconditionally emit the final report.
    pub(crate) fn finish(&self, snapshot: &ProgressSnapshot) {
        self.callback.on_progress(snapshot);
    }
}
