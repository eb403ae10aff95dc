//! Upload validation integration tests.
//!
//! Some tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use framesift::{
    FrameSiftError, is_supported_video, sanitize_filename,
    validation::{ensure_supported_video, validate_video},
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.mp4"
}

#[test]
fn upload_names_are_screened_then_sanitized() {
    let uploaded = "../../Week 2 Lecture.MKV";
    assert!(is_supported_video(uploaded));

    let stored = sanitize_filename(uploaded);
    assert_eq!(stored, "Week_2_Lecture.MKV");
    assert!(is_supported_video(&stored));
    assert!(!stored.contains('/'));
}

#[test]
fn unsupported_upload_is_rejected() {
    let error = ensure_supported_video("slides.pdf").unwrap_err();
    assert!(matches!(error, FrameSiftError::UnsupportedFormat(_)));
    assert!(error.to_string().contains("slides.pdf"));
}

#[test]
fn validate_normal_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let report = validate_video(Path::new(path)).expect("Failed to open fixture");

    assert!(report.is_valid(), "Normal video should be valid: {report}");
    assert!(report.info.iter().any(|line| line.contains("Video:")));
}

#[test]
fn validate_renamed_video_flags_extension() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary = tempfile::tempdir().unwrap();
    let renamed = temporary.path().join("lecture.bin");
    std::fs::copy(path, &renamed).unwrap();

    let report = validate_video(&renamed).expect("Container should still open");
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|line| line.contains("lecture.bin")));
}

#[test]
fn validate_audio_only_fails() {
    let path = sample_audio_only_path();
    if !Path::new(path).exists() {
        return;
    }

    assert!(matches!(
        validate_video(Path::new(path)),
        Err(FrameSiftError::NoVideoStream)
    ));
}

#[test]
fn report_display_lists_findings() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let report = validate_video(Path::new(path)).unwrap();
    let rendered = report.to_string();
    assert!(rendered.starts_with("[INFO] Video:"));
}
