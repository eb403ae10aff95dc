//! Structural similarity and the duplicate filter.
//!
//! [`ssim`] computes the mean structural similarity index of two luminance
//! images using the standard formulation: a 7×7 uniform window, constants
//! `K1 = 0.01` and `K2 = 0.03` over an 8-bit data range, and sample
//! (N − 1) covariance normalisation. Only windows that lie fully inside the
//! image contribute to the mean.
//!
//! [`DuplicateFilter`] holds the kept-frame set of one extraction run and
//! rejects candidates that are too similar to any of them.

use image::{GrayImage, RgbImage, imageops::FilterType};

use crate::luma::luminance;

const WINDOW: u32 = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Window sums of the five moments SSIM needs.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    x: u64,
    y: u64,
    xx: u64,
    yy: u64,
    xy: u64,
}

impl Moments {
    fn of(a: u8, b: u8) -> Self {
        let (a, b) = (u64::from(a), u64::from(b));
        Self {
            x: a,
            y: b,
            xx: a * a,
            yy: b * b,
            xy: a * b,
        }
    }

    fn add(&mut self, other: &Moments) {
        self.x += other.x;
        self.y += other.y;
        self.xx += other.xx;
        self.yy += other.yy;
        self.xy += other.xy;
    }

    fn sub(&mut self, other: &Moments) {
        self.x -= other.x;
        self.y -= other.y;
        self.xx -= other.xx;
        self.yy -= other.yy;
        self.xy -= other.xy;
    }
}

/// Largest odd window no bigger than [`WINDOW`] that fits the image.
fn window_size(width: u32, height: u32) -> u32 {
    let limit = WINDOW.min(width).min(height);
    if limit == 0 {
        0
    } else if limit % 2 == 0 {
        limit - 1
    } else {
        limit
    }
}

/// Mean SSIM of two equally sized luminance images.
///
/// Returns a value in `[-1, 1]`; identical images score exactly 1.
/// Images of different sizes, or empty images, score 0.
pub fn ssim(first: &GrayImage, second: &GrayImage) -> f64 {
    if first.dimensions() != second.dimensions() {
        return 0.0;
    }
    let (width, height) = first.dimensions();
    let window = window_size(width, height);
    if window == 0 {
        return 0.0;
    }

    let (width, height, window) = (width as usize, height as usize, window as usize);
    let samples = (window * window) as f64;
    let covariance_norm = if window > 1 {
        samples / (samples - 1.0)
    } else {
        1.0
    };
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let a = first.as_raw();
    let b = second.as_raw();

    // Per-column sums over the current band of `window` rows.
    let mut columns = vec![Moments::default(); width];
    let mut total = 0.0;
    let mut count = 0u64;

    for row in 0..height {
        let offset = row * width;
        for (x, column) in columns.iter_mut().enumerate() {
            column.add(&Moments::of(a[offset + x], b[offset + x]));
        }
        if row >= window {
            let old = (row - window) * width;
            for (x, column) in columns.iter_mut().enumerate() {
                column.sub(&Moments::of(a[old + x], b[old + x]));
            }
        }
        if row + 1 < window {
            continue;
        }

        let mut band = Moments::default();
        for x in 0..width {
            band.add(&columns[x]);
            if x >= window {
                band.sub(&columns[x - window]);
            }
            if x + 1 < window {
                continue;
            }

            let mean_x = band.x as f64 / samples;
            let mean_y = band.y as f64 / samples;
            let variance_x = covariance_norm * (band.xx as f64 / samples - mean_x * mean_x);
            let variance_y = covariance_norm * (band.yy as f64 / samples - mean_y * mean_y);
            let covariance = covariance_norm * (band.xy as f64 / samples - mean_x * mean_y);

            let numerator = (2.0 * mean_x * mean_y + c1) * (2.0 * covariance + c2);
            let denominator =
                (mean_x * mean_x + mean_y * mean_y + c1) * (variance_x + variance_y + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    total / count as f64
}

/// Resize `image` to `width × height` unless it already has that size.
pub(crate) fn match_dimensions(image: &GrayImage, width: u32, height: u32) -> Option<GrayImage> {
    if image.dimensions() == (width, height) {
        None
    } else {
        Some(image::imageops::resize(
            image,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

/// SSIM of two luminance images, resizing `other` to `reference`'s size
/// when they differ.
pub fn ssim_resized(reference: &GrayImage, other: &GrayImage) -> f64 {
    let (width, height) = reference.dimensions();
    match match_dimensions(other, width, height) {
        Some(resized) => ssim(reference, &resized),
        None => ssim(reference, other),
    }
}

/// SSIM of two colour frames.
///
/// Both are converted to luminance; `other` is resized to `reference`'s
/// size if needed.
pub fn structural_similarity(reference: &RgbImage, other: &RgbImage) -> f64 {
    ssim_resized(&luminance(reference), &luminance(other))
}

/// A candidate's match against the kept-frame set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateMatch {
    /// Position of the matching frame in acceptance order.
    pub kept_index: usize,
    /// SSIM between the candidate and that frame.
    pub similarity: f64,
}

/// The kept-frame set of one extraction run.
///
/// Frames are stored as luminance planes in acceptance order and never
/// evicted, so each candidate costs one comparison per kept frame.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    threshold: f64,
    kept: Vec<GrayImage>,
}

impl DuplicateFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            kept: Vec::new(),
        }
    }

    /// Compare `candidate` against every kept frame in insertion order and
    /// return the first one whose similarity meets the threshold.
    pub fn find_duplicate(&self, candidate: &GrayImage) -> Option<DuplicateMatch> {
        self.kept.iter().enumerate().find_map(|(kept_index, kept)| {
            let similarity = ssim_resized(candidate, kept);
            (similarity >= self.threshold).then_some(DuplicateMatch {
                kept_index,
                similarity,
            })
        })
    }

    /// Add an accepted frame to the comparison basis.
    pub fn remember(&mut self, frame: GrayImage) {
        self.kept.push(frame);
    }

    /// Number of kept frames.
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
