//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and cached for its lifetime. The frame rate drives the sampler;
//! the frame count feeds the progress percentage.

use std::time::Duration;

/// Metadata for the decoded video stream.
///
/// # Example
///
/// ```no_run
/// use framesift::VideoFile;
///
/// let video = VideoFile::open("input.mp4")?;
/// let metadata = video.metadata();
/// println!(
///     "{}x{} @ {:.2} fps, ~{} frames",
///     metadata.width, metadata.height, metadata.frames_per_second, metadata.frame_count,
/// );
/// # Ok::<(), framesift::FrameSiftError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate
    /// content). Zero when the container does not report a rate.
    pub frames_per_second: f64,
    /// Total number of frames: the stream's own count when the container
    /// records one, otherwise estimated from duration and frame rate.
    /// Zero when unknown.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Container duration.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}
