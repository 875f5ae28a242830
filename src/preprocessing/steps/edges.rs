use super::threshold::EdgeThresholds;
use image::GrayImage;
use imageproc::edges::canny;

/// Canny edge map; edge pixels are 255, everything else 0
pub fn apply(image: &GrayImage, thresholds: EdgeThresholds) -> GrayImage {
    canny(image, thresholds.lower, thresholds.upper)
}
