//! Numbered frame persistence.
//!
//! Kept frames are written as `frame_0001.png`, `frame_0002.png`, … in the
//! order they are accepted. The output directory is created on first use.
//! When it already holds numbered frames from an earlier run, numbering
//! continues after the highest existing number so nothing is overwritten.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::RgbImage;

use crate::error::FrameSiftError;

const PREFIX: &str = "frame_";
const EXTENSION: &str = "png";

/// File name for the `number`-th kept frame.
///
/// ```
/// assert_eq!(framesift::output::frame_file_name(7), "frame_0007.png");
/// assert_eq!(framesift::output::frame_file_name(12345), "frame_12345.png");
/// ```
pub fn frame_file_name(number: u64) -> String {
    format!("{PREFIX}{number:04}.{EXTENSION}")
}

/// Parse the number out of a `frame_NNNN.png` file name.
pub fn parse_frame_number(name: &str) -> Option<u64> {
    let digits = name
        .strip_prefix(PREFIX)?
        .strip_suffix(EXTENSION)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Highest frame number already present in `directory`, or 0.
pub fn highest_frame_number(directory: &Path) -> Result<u64, FrameSiftError> {
    if !directory.exists() {
        return Ok(0);
    }
    let mut highest = 0;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if let Some(number) = entry.file_name().to_str().and_then(parse_frame_number) {
            highest = highest.max(number);
        }
    }
    Ok(highest)
}

/// Sorted list of the numbered frames in `directory`.
pub fn list_frames(directory: &Path) -> Result<Vec<PathBuf>, FrameSiftError> {
    let mut frames: Vec<(u64, PathBuf)> = fs::read_dir(directory)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let number = entry.file_name().to_str().and_then(parse_frame_number)?;
            Some((number, entry.path()))
        })
        .collect();
    frames.sort_unstable_by_key(|(number, _)| *number);
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

/// Writes kept frames under sequential numbers.
#[derive(Debug)]
pub struct FrameWriter {
    directory: PathBuf,
    next_number: u64,
    written: u64,
}

impl FrameWriter {
    /// Create `directory` (and parents) and position the counter after any
    /// frames already in it.
    ///
    /// # Errors
    ///
    /// [`FrameSiftError::IoError`] if the directory cannot be created or
    /// listed.
    pub fn create<P: AsRef<Path>>(directory: P) -> Result<Self, FrameSiftError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        let highest = highest_frame_number(&directory)?;
        if highest > 0 {
            log::warn!(
                "{} already holds frames up to {}; numbering continues from {}",
                directory.display(),
                frame_file_name(highest),
                frame_file_name(highest + 1),
            );
        }
        Ok(Self {
            directory,
            next_number: highest + 1,
            written: 0,
        })
    }

    /// Save `frame` under the next number and return its path.
    ///
    /// # Errors
    ///
    /// Propagates encoding and write failures (disk full, permissions).
    pub fn write(&mut self, frame: &RgbImage) -> Result<PathBuf, FrameSiftError> {
        let path = self.directory.join(frame_file_name(self.next_number));
        frame.save(&path)?;
        self.next_number += 1;
        self.written += 1;
        Ok(path)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Frames written by this writer.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_numbered_frames() {
        assert_eq!(parse_frame_number("frame_0001.png"), Some(1));
        assert_eq!(parse_frame_number("frame_10000.png"), Some(10000));
        assert_eq!(parse_frame_number("frame_.png"), None);
        assert_eq!(parse_frame_number("frame_00a1.png"), None);
        assert_eq!(parse_frame_number("frame_0001.jpg"), None);
        assert_eq!(parse_frame_number("frame_0001png"), None);
        assert_eq!(parse_frame_number("cover.png"), None);
    }

    #[test]
    fn fresh_directory_starts_at_one() {
        let temporary = tempfile::tempdir().unwrap();
        let target = temporary.path().join("nested").join("out");
        let mut writer = FrameWriter::create(&target).unwrap();

        let first = writer.write(&RgbImage::new(4, 4)).unwrap();
        let second = writer.write(&RgbImage::new(4, 4)).unwrap();

        assert_eq!(first.file_name().unwrap(), "frame_0001.png");
        assert_eq!(second.file_name().unwrap(), "frame_0002.png");
        assert_eq!(writer.written(), 2);
        assert_eq!(list_frames(&target).unwrap(), vec![first, second]);
    }

    #[test]
    fn reused_directory_continues_numbering() {
        let temporary = tempfile::tempdir().unwrap();
        fs::write(temporary.path().join("frame_0003.png"), b"old").unwrap();
        fs::write(temporary.path().join("notes.txt"), b"unrelated").unwrap();

        let mut writer = FrameWriter::create(temporary.path()).unwrap();
        let path = writer.write(&RgbImage::new(2, 2)).unwrap();

        assert_eq!(path.file_name().unwrap(), "frame_0004.png");
        assert_eq!(
            fs::read(temporary.path().join("frame_0003.png")).unwrap(),
            b"old"
        );
    }
}
