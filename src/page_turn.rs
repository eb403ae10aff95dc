//! Page-turn detection for review.
//!
//! [`is_page_turn_image`] flags a kept frame that is probably a transition
//! artifact rather than stable content: a frame caught mid page turn or
//! mid cross-fade. It only annotates; it never deletes anything.
//!
//! A target counts as a page turn when either
//!
//! - it fails the quality heuristic (sharpness or contrast below the
//!   thresholds in [`PageTurnOptions`]), or
//! - both neighbours are given, it resembles each of them at least
//!   `neighbour_similarity`, and it resembles each of them more than they
//!   resemble each other by at least `blend_margin`. A cross-fade between
//!   two pages has exactly this shape.

use std::path::Path;

use image::GrayImage;

use crate::{
    error::FrameSiftError,
    luma::luminance,
    quality::{QualityFilter, QualityScores},
    similarity::ssim_resized,
};

/// Thresholds for [`is_page_turn_image_with_options`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTurnOptions {
    /// Minimum Laplacian variance of a stable frame. Default 100.
    pub sharpness_threshold: f64,
    /// Minimum luminance standard deviation of a stable frame. Default 20.
    pub contrast_threshold: f64,
    /// Minimum SSIM to each neighbour for the blend rule. Default 0.5.
    pub neighbour_similarity: f64,
    /// How much closer to each neighbour than the neighbours are to each
    /// other the target must be. Default 0.05.
    pub blend_margin: f64,
}

impl Default for PageTurnOptions {
    fn default() -> Self {
        Self {
            sharpness_threshold: 100.0,
            contrast_threshold: 20.0,
            neighbour_similarity: 0.5,
            blend_margin: 0.05,
        }
    }
}

fn load_luma(path: &Path) -> Result<GrayImage, FrameSiftError> {
    Ok(luminance(&image::open(path)?.to_rgb8()))
}

/// Decide whether the image at `path` is a page-turn artifact, using
/// default thresholds.
///
/// # Errors
///
/// [`FrameSiftError::ImageError`] if any given image cannot be read.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let turning = framesift::is_page_turn_image(
///     Path::new("frames/frame_0005.png"),
///     Some(Path::new("frames/frame_0004.png")),
///     Some(Path::new("frames/frame_0006.png")),
/// )?;
/// # Ok::<(), framesift::FrameSiftError>(())
/// ```
pub fn is_page_turn_image(
    path: &Path,
    previous: Option<&Path>,
    next: Option<&Path>,
) -> Result<bool, FrameSiftError> {
    is_page_turn_image_with_options(path, previous, next, &PageTurnOptions::default())
}

/// [`is_page_turn_image`] with explicit thresholds.
///
/// # Errors
///
/// [`FrameSiftError::ImageError`] if any given image cannot be read.
pub fn is_page_turn_image_with_options(
    path: &Path,
    previous: Option<&Path>,
    next: Option<&Path>,
    options: &PageTurnOptions,
) -> Result<bool, FrameSiftError> {
    let target = load_luma(path)?;
    let previous = previous.map(load_luma).transpose()?;
    let next = next.map(load_luma).transpose()?;
    Ok(is_page_turn(&target, previous.as_ref(), next.as_ref(), options))
}

/// The decision on already-loaded luminance images.
pub fn is_page_turn(
    target: &GrayImage,
    previous: Option<&GrayImage>,
    next: Option<&GrayImage>,
    options: &PageTurnOptions,
) -> bool {
    let scores = QualityScores::measure(target);
    let quality = QualityFilter::new(options.sharpness_threshold, options.contrast_threshold);
    if !quality.accepts(&scores) {
        log::debug!(
            "Page turn: sharpness {:.1}, contrast {:.1} below thresholds",
            scores.sharpness,
            scores.contrast
        );
        return true;
    }

    let (Some(previous), Some(next)) = (previous, next) else {
        return false;
    };

    let to_previous = ssim_resized(target, previous);
    let to_next = ssim_resized(target, next);
    let between = ssim_resized(previous, next);
    log::debug!(
        "Page turn similarities: previous {to_previous:.3}, next {to_next:.3}, neighbours {between:.3}"
    );

    to_previous >= options.neighbour_similarity
        && to_next >= options.neighbour_similarity
        && to_previous.min(to_next) >= between + options.blend_margin
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn page(seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
        GrayImage::from_fn(64, 48, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([if state >> 31 == 0 { 20 } else { 235 }])
        })
    }

    fn blend(a: &GrayImage, b: &GrayImage) -> GrayImage {
        GrayImage::from_fn(a.width(), a.height(), |x, y| {
            let mix = (u16::from(a.get_pixel(x, y)[0]) + u16::from(b.get_pixel(x, y)[0])) / 2;
            Luma([mix as u8])
        })
    }

    #[test]
    fn flat_frame_is_a_page_turn() {
        let flat = GrayImage::from_pixel(64, 48, Luma([200]));
        assert!(is_page_turn(&flat, None, None, &PageTurnOptions::default()));
    }

    #[test]
    fn sharp_frame_without_neighbours_is_stable() {
        assert!(!is_page_turn(&page(1), None, None, &PageTurnOptions::default()));
    }

    #[test]
    fn cross_fade_between_neighbours_is_a_page_turn() {
        let previous = page(1);
        let next = page(2);
        let fade = blend(&previous, &next);
        assert!(is_page_turn(
            &fade,
            Some(&previous),
            Some(&next),
            &PageTurnOptions::default()
        ));
    }

    #[test]
    fn distinct_page_between_neighbours_is_stable() {
        let options = PageTurnOptions::default();
        assert!(!is_page_turn(&page(3), Some(&page(1)), Some(&page(2)), &options));
    }

    #[test]
    fn one_neighbour_only_uses_quality() {
        let options = PageTurnOptions::default();
        let previous = page(1);
        let fade = blend(&previous, &page(2));
        assert!(!is_page_turn(&fade, Some(&previous), None, &options));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let result = is_page_turn_image(Path::new("/nonexistent/frame.png"), None, None);
        assert!(result.is_err());
    }
}
