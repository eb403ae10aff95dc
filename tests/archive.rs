//! Archive packaging integration tests.

use std::{fs::File, io::Read, path::Path};

use framesift::{
    ExtractionConfig, FrameSiftError, MemorySource, extract_frames_from, write_archive,
};
use image::{Rgb, RgbImage};
use zip::ZipArchive;

fn slide(seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(0x9E37_79B9);
    RgbImage::from_fn(32, 24, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let value = if state >> 31 == 0 { 20 } else { 235 };
        Rgb([value, value, value])
    })
}

fn extract_three(directory: &Path) {
    let config = ExtractionConfig::new().with_require_text(false);
    let mut source = MemorySource::new((0..3).map(slide).collect(), 1.0);
    extract_frames_from(&mut source, directory, &config).expect("Extraction failed");
}

fn entry_names(archive_path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[test]
fn empty_selection_packs_every_frame() {
    let temporary = tempfile::tempdir().unwrap();
    let frames = temporary.path().join("frames");
    extract_three(&frames);
    let destination = temporary.path().join("all.zip");

    let count = write_archive(&frames, &[], &destination).unwrap();

    assert_eq!(count, 3);
    let mut names = entry_names(&destination);
    names.sort();
    assert_eq!(
        names,
        vec!["frame_0001.png", "frame_0002.png", "frame_0003.png"]
    );
}

#[test]
fn selection_packs_only_named_frames_intact() {
    let temporary = tempfile::tempdir().unwrap();
    let frames = temporary.path().join("frames");
    extract_three(&frames);
    let destination = temporary.path().join("picked.zip");

    let selection = vec!["frame_0002.png".to_string()];
    write_archive(&frames, &selection, &destination).unwrap();

    let mut archive = ZipArchive::new(File::open(&destination).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    let mut packed = Vec::new();
    archive
        .by_name("frame_0002.png")
        .unwrap()
        .read_to_end(&mut packed)
        .unwrap();
    assert_eq!(packed, std::fs::read(frames.join("frame_0002.png")).unwrap());
}

#[test]
fn escaping_names_are_rejected_without_writing() {
    let temporary = tempfile::tempdir().unwrap();
    let frames = temporary.path().join("frames");
    extract_three(&frames);
    std::fs::write(temporary.path().join("secret.png"), b"secret").unwrap();
    let destination = temporary.path().join("bad.zip");

    for name in ["../secret.png", "frame_0009.png"] {
        let selection = vec!["frame_0001.png".to_string(), name.to_string()];
        let result = write_archive(&frames, &selection, &destination);
        assert!(
            matches!(result, Err(FrameSiftError::InvalidArchiveEntry(_))),
            "{name} should be rejected"
        );
    }
    assert!(!destination.exists());
}

#[test]
fn empty_directory_gives_empty_archive() {
    let temporary = tempfile::tempdir().unwrap();
    let destination = temporary.path().join("empty.zip");

    let count = write_archive(temporary.path(), &[], &destination).unwrap();

    assert_eq!(count, 0);
    assert!(entry_names(&destination).is_empty());
}

#[test]
fn repeated_selection_is_rejected_and_keeps_previous_archive() {
    let temporary = tempfile::tempdir().unwrap();
    let frames = temporary.path().join("frames");
    extract_three(&frames);
    let destination = temporary.path().join("picked.zip");
    write_archive(&frames, &["frame_0002.png".to_string()], &destination).unwrap();
    let previous = std::fs::read(&destination).unwrap();

    let selection = vec!["frame_0001.png".to_string(), "frame_0001.png".to_string()];
    let result = write_archive(&frames, &selection, &destination);

    assert!(matches!(result, Err(FrameSiftError::InvalidArchiveEntry(_))));
    assert_eq!(std::fs::read(&destination).unwrap(), previous);
    assert_eq!(entry_names(&destination), vec!["frame_0002.png"]);
}
