//! Frame sources and interval sampling.
//!
//! A [`FrameSource`] yields decoded frames strictly in decode order, each
//! exactly once. [`FrameSampler`] decides which of them the pipeline
//! examines: every `frame_interval`-th frame, where
//! `frame_interval = floor(fps × interval_seconds)`.

use std::collections::VecDeque;

use image::RgbImage;

use crate::error::FrameSiftError;

/// A monotonic stream of decoded RGB frames.
///
/// [`VideoFile`](crate::VideoFile) is the FFmpeg-backed implementation;
/// [`MemorySource`] serves pre-built frames.
pub trait FrameSource {
    /// Nominal frame rate. Zero or non-finite when unknown.
    fn frames_per_second(&self) -> f64;

    /// Total frame count reported by the source. Zero when unknown.
    fn total_frames(&self) -> u64;

    /// Decode the next frame, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Any decode failure. The pipeline aborts the run on error.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError>;
}

/// A [`FrameSource`] over frames already held in memory.
///
/// ```
/// use framesift::{FrameSource, MemorySource};
/// use image::RgbImage;
///
/// let mut source = MemorySource::new(vec![RgbImage::new(4, 4); 3], 30.0);
/// assert_eq!(source.total_frames(), 3);
/// assert!(source.next_frame()?.is_some());
/// # Ok::<(), framesift::FrameSiftError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    frames_per_second: f64,
    total_frames: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>, frames_per_second: f64) -> Self {
        let total_frames = frames.len() as u64;
        Self {
            frames: frames.into(),
            frames_per_second,
            total_frames,
        }
    }

    /// Report `total` as the frame count instead of the real length.
    #[must_use]
    pub fn with_reported_total(mut self, total: u64) -> Self {
        self.total_frames = total;
        self
    }
}

impl FrameSource for MemorySource {
    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError> {
        Ok(self.frames.pop_front())
    }
}

/// Decides which decoded frames are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    frame_interval: u64,
}

impl FrameSampler {
    /// Build a sampler for a source running at `frames_per_second`.
    ///
    /// The product is floored with a small tolerance so that values such as
    /// `100 × 0.29` land on 29 rather than 28.999…. A product below 1, or an
    /// unreadable frame rate, gives an interval of 0, which samples every
    /// frame.
    pub fn new(frames_per_second: f64, interval_seconds: f64) -> Self {
        let product = frames_per_second * interval_seconds;
        let frame_interval = if product.is_finite() && product >= 1.0 - 1e-9 {
            (product + 1e-9).floor() as u64
        } else {
            0
        };
        Self { frame_interval }
    }

    /// Number of decoded frames between samples. Zero means every frame.
    pub fn frame_interval(&self) -> u64 {
        self.frame_interval
    }

    /// Whether the frame at 0-based decode position `index` is sampled.
    pub fn is_sampled(&self, index: u64) -> bool {
        self.frame_interval == 0 || index % self.frame_interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_fps_one_second() {
        let sampler = FrameSampler::new(30.0, 1.0);
        assert_eq!(sampler.frame_interval(), 30);
        let sampled: Vec<u64> = (0..300).filter(|&i| sampler.is_sampled(i)).collect();
        assert_eq!(sampled, (0..10).map(|i| i * 30).collect::<Vec<_>>());
    }

    #[test]
    fn fractional_rates_are_floored() {
        assert_eq!(FrameSampler::new(29.97, 1.0).frame_interval(), 29);
        assert_eq!(FrameSampler::new(25.0, 0.5).frame_interval(), 12);
        assert_eq!(FrameSampler::new(100.0, 0.29).frame_interval(), 29);
    }

    #[test]
    fn zero_interval_samples_everything() {
        for sampler in [
            FrameSampler::new(30.0, 0.01),
            FrameSampler::new(0.0, 1.0),
            FrameSampler::new(f64::NAN, 1.0),
        ] {
            assert_eq!(sampler.frame_interval(), 0);
            assert!((0..50).all(|i| sampler.is_sampled(i)));
        }
    }

    #[test]
    fn memory_source_drains_in_order() {
        let frames = (0..3u8)
            .map(|v| RgbImage::from_pixel(2, 2, image::Rgb([v, v, v])))
            .collect();
        let mut source = MemorySource::new(frames, 10.0);
        for expected in 0..3u8 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.get_pixel(0, 0)[0], expected);
        }
        assert!(source.next_frame().unwrap().is_none());
    }
}
