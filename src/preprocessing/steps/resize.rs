use crate::geometry::ResizeRatios;
use image::{imageops, imageops::FilterType, GrayImage};

/// Resize to the canonical working resolution and record the
/// original/working ratio per axis
pub fn to_working(gray: &GrayImage, width: u32, height: u32) -> (GrayImage, ResizeRatios) {
    let ratios = ResizeRatios::between(gray.dimensions(), (width, height));

    if gray.dimensions() == (width, height) {
        return (gray.clone(), ratios);
    }

    // Bilinear, matching the working-frame geometry the detection bands were tuned on
    let resized = imageops::resize(gray, width, height, FilterType::Triangle);
    (resized, ratios)
}
