//! FFmpeg-backed sequential frame decoding.
//!
//! [`VideoFile`] opens a container, selects its best video stream, and
//! implements [`FrameSource`] by decoding every frame once, in order, and
//! converting it to packed RGB. There is no seeking: the extraction
//! pipeline needs to see every frame to count them, and only examines the
//! sampled ones.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{FrameSource, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let mut count = 0;
//! while let Some(frame) = video.next_frame()? {
//!     if count == 0 {
//!         frame.save("first_frame.png")?;
//!     }
//!     count += 1;
//! }
//! println!("decoded {count} frames");
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    error::FrameSiftError,
    metadata::VideoMetadata,
    sampler::FrameSource,
    utilities::{frame_to_rgb_buffer, rational_to_f64},
};

/// Consecutive demuxer read errors tolerated before the run is aborted.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 32;

/// An opened video, positioned at its first frame.
pub struct VideoFile {
    input_context: Input,
    decoder: VideoDecoder,
    /// Built on the first decoded frame and rebuilt if the decoded
    /// format or size changes mid-stream.
    scaler: Option<(ScalingContext, Pixel, u32, u32)>,
    video_stream_index: usize,
    metadata: VideoMetadata,
    path: PathBuf,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("eof_sent", &self.eof_sent)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file for sequential decoding.
    ///
    /// Initialises FFmpeg (idempotent), opens the container, and caches the
    /// best video stream's metadata.
    ///
    /// # Errors
    ///
    /// - [`FrameSiftError::VideoNotFound`] if `path` does not exist.
    /// - [`FrameSiftError::FileOpen`] if the container or its video codec
    ///   cannot be opened.
    /// - [`FrameSiftError::NoVideoStream`] if there is no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameSiftError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(FrameSiftError::VideoNotFound { path });
        }

        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| FrameSiftError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FrameSiftError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FrameSiftError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                FrameSiftError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| FrameSiftError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = match rational_to_f64(stream.avg_frame_rate()) {
            rate if rate > 0.0 => rate,
            _ => rational_to_f64(stream.rate()),
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            duration,
            format: input_context.format().name().to_string(),
        };

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, {} frames [{}]",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            metadata,
            path,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Metadata cached at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// The path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scale and convert the current `decoded_frame` to an [`RgbImage`].
    fn convert_current_frame(&mut self) -> Result<RgbImage, FrameSiftError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = !matches!(
            &self.scaler,
            Some((_, f, w, h)) if *f == format && *w == width && *h == height
        );
        if stale {
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((context, format, width, height));
        }

        if let Some((scaler, ..)) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        let buffer = frame_to_rgb_buffer(&self.rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FrameSiftError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

impl FrameSource for VideoFile {
    fn frames_per_second(&self) -> f64 {
        self.metadata.frames_per_second
    }

    fn total_frames(&self) -> u64 {
        self.metadata.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError> {
        let mut read_errors = 0;

        loop {
            if self.done {
                return Ok(None);
            }

            // Drain frames the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    log::warn!(
                        "Skipping unreadable packet in {}: {error}",
                        self.path.display()
                    );
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        self.done = true;
                        return Err(FrameSiftError::VideoDecodeError(format!(
                            "{read_errors} consecutive read errors, last: {error}"
                        )));
                    }
                }
            }
        }
    }
}
