//! Benchmarks for the per-frame scoring stages.
//!
//! Run with: cargo bench
//!
//! The end-to-end benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use criterion::Criterion;
use framesift::{
    DuplicateFilter, ExtractionConfig, FfmpegLogLevel, QualityScores, extract_frames,
    luma::luminance, ssim,
};
use image::{GrayImage, Luma, Rgb, RgbImage};

const SLIDES_VIDEO: &str = "tests/fixtures/slides.mp4";

fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    GrayImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Luma([(state >> 24) as u8])
    })
}

fn benchmark_luminance(criterion: &mut Criterion) {
    let frame = RgbImage::from_fn(1280, 720, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
    criterion.bench_function("luminance 720p", |bencher| {
        bencher.iter(|| luminance(&frame));
    });
}

fn benchmark_ssim(criterion: &mut Criterion) {
    let first = noise(1280, 720, 1);
    let second = noise(1280, 720, 2);
    criterion.bench_function("ssim 720p", |bencher| {
        bencher.iter(|| ssim(&first, &second));
    });

    let mut filter = DuplicateFilter::new(0.95);
    for seed in 0..20 {
        filter.remember(noise(640, 360, seed));
    }
    let candidate = noise(640, 360, 99);
    criterion.bench_function("duplicate scan, 20 kept frames at 360p", |bencher| {
        bencher.iter(|| filter.find_duplicate(&candidate));
    });
}

fn benchmark_quality(criterion: &mut Criterion) {
    let gray = noise(1280, 720, 3);
    criterion.bench_function("sharpness + contrast 720p", |bencher| {
        bencher.iter(|| QualityScores::measure(&gray));
    });
}

fn benchmark_extraction(criterion: &mut Criterion) {
    framesift::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SLIDES_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let config = ExtractionConfig::new().with_require_text(false);
    criterion.bench_function("extract slides fixture (no OCR)", |bencher| {
        bencher.iter(|| {
            let output = tempfile::tempdir().unwrap();
            extract_frames(SLIDES_VIDEO, output.path(), &config).unwrap()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_luminance,
    benchmark_ssim,
    benchmark_quality,
    benchmark_extraction,
);
criterion::criterion_main!(benches);
