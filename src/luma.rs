//! Luminance conversion shared by the frame scorers.
//!
//! Uses ITU-R BT.601 weights in 14-bit fixed point, the conversion common
//! video tooling applies to 8-bit RGB. The `image` crate's own `to_luma8`
//! uses Rec. 709 weights, which shifts every score slightly, so the scorers
//! go through this function instead.

use image::{GrayImage, RgbImage};

const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

/// Convert an RGB frame to single-channel luminance.
pub fn luminance(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let buffer: Vec<u8> = frame
        .as_raw()
        .chunks_exact(3)
        .map(|pixel| {
            let y = u32::from(pixel[0]) * R_WEIGHT
                + u32::from(pixel[1]) * G_WEIGHT
                + u32::from(pixel[2]) * B_WEIGHT
                + ROUND;
            (y >> SHIFT) as u8
        })
        .collect();

    // Same pixel count by construction.
    GrayImage::from_raw(width, height, buffer).unwrap_or_else(|| GrayImage::new(width, height))
}
