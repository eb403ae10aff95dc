//! Image-quality heuristics.
//!
//! Two scalar scores flag frames that are unlikely to carry readable
//! content:
//!
//! - **sharpness**: variance of the 4-neighbour Laplacian response. Motion
//!   blur, defocus, and flat fades all give low values.
//! - **contrast**: standard deviation of the luminance values. Washed-out
//!   or solid-colour frames give low values.
//!
//! Both operate on the luminance plane produced by
//! [`luminance`](crate::luma::luminance).

use image::GrayImage;

/// Scores of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityScores {
    /// Laplacian variance.
    pub sharpness: f64,
    /// Luminance standard deviation.
    pub contrast: f64,
}

impl QualityScores {
    /// Score a luminance image.
    pub fn measure(gray: &GrayImage) -> Self {
        Self {
            sharpness: sharpness(gray),
            contrast: contrast(gray),
        }
    }
}

/// Mirror an out-of-range coordinate back into `0..len` without repeating
/// the edge sample (`dcb|abcd|cba`).
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let mut index = index;
    if index < 0 {
        index = -index;
    }
    if index >= len {
        index = 2 * (len - 1) - index;
    }
    index as usize
}

/// Variance of the Laplacian response over the whole image.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]`, borders reflected without repeating
/// the edge pixel. Empty images score 0.
pub fn sharpness(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return 0.0;
    }

    let data = gray.as_raw();
    let at = |x: isize, y: isize| -> f64 {
        f64::from(data[reflect(y, height) * width + reflect(x, width)])
    };

    let mut sum = 0.0;
    let mut sum_squares = 0.0;
    for y in 0..height as isize {
        for x in 0..width as isize {
            let response =
                at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y);
            sum += response;
            sum_squares += response * response;
        }
    }

    let count = (width * height) as f64;
    let mean = sum / count;
    (sum_squares / count - mean * mean).max(0.0)
}

/// Population standard deviation of the luminance values.
pub fn contrast(gray: &GrayImage) -> f64 {
    let data = gray.as_raw();
    if data.is_empty() {
        return 0.0;
    }

    let count = data.len() as f64;
    let mean = data.iter().map(|&v| f64::from(v)).sum::<f64>() / count;
    let variance = data
        .iter()
        .map(|&v| {
            let delta = f64::from(v) - mean;
            delta * delta
        })
        .sum::<f64>()
        / count;
    variance.sqrt()
}

/// Accept/reject decision on the two quality scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityFilter {
    pub sharpness_threshold: f64,
    pub contrast_threshold: f64,
}

impl QualityFilter {
    pub fn new(sharpness_threshold: f64, contrast_threshold: f64) -> Self {
        Self {
            sharpness_threshold,
            contrast_threshold,
        }
    }

    /// Returns `true` when both scores meet their thresholds.
    pub fn accepts(&self, scores: &QualityScores) -> bool {
        scores.sharpness >= self.sharpness_threshold && scores.contrast >= self.contrast_threshold
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, imageops};

    use super::*;

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([30])
            } else {
                Luma([220])
            }
        })
    }

    #[test]
    fn reflection_skips_edge_sample() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(6, 5), 2);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-1, 1), 0);
    }

    #[test]
    fn flat_frame_scores_zero() {
        let flat = GrayImage::from_pixel(20, 10, Luma([128]));
        let scores = QualityScores::measure(&flat);
        assert_eq!(scores.sharpness, 0.0);
        assert_eq!(scores.contrast, 0.0);
    }

    #[test]
    fn contrast_of_two_level_image() {
        let image = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 100 }]));
        assert!((contrast(&image) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn blur_lowers_sharpness() {
        let sharp = checkerboard(64, 4);
        let blurred = imageops::blur(&sharp, 3.0);
        assert!(sharpness(&sharp) > 10.0 * sharpness(&blurred));
        assert!(sharpness(&sharp) > 150.0);
    }

    #[test]
    fn single_impulse_response() {
        // One bright pixel in the middle of a 3x3 dark field.
        let mut image = GrayImage::from_pixel(3, 3, Luma([0]));
        image.put_pixel(1, 1, Luma([10]));
        // Centre -40. Edge midpoints see the impulse twice through the
        // reflected border; corners never touch it.
        let responses = [0.0, 20.0, 0.0, 20.0, -40.0, 20.0, 0.0, 20.0, 0.0];
        let mean = responses.iter().sum::<f64>() / 9.0;
        let expected =
            responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / 9.0;
        assert!((sharpness(&image) - expected).abs() < 1e-9);
    }

    #[test]
    fn filter_needs_both_scores() {
        let filter = QualityFilter::new(100.0, 20.0);
        let ok = QualityScores {
            sharpness: 100.0,
            contrast: 20.0,
        };
        assert!(filter.accepts(&ok));
        assert!(!filter.accepts(&QualityScores {
            sharpness: 99.9,
            ..ok
        }));
        assert!(!filter.accepts(&QualityScores {
            contrast: 19.9,
            ..ok
        }));
    }
}
