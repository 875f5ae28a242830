use image::{DynamicImage, GrayImage};

/// Convert the source image to a single luminance channel
/// Every edge and contour stage works on this representation
pub fn apply(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}
