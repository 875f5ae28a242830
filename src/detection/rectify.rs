use crate::geometry::RotatedBox;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::point::Point;

/// Canonical frame the rectified crop is scaled into, and the margin trimmed
/// from each side afterwards
#[derive(Debug, Clone, Copy)]
pub struct RectifyParams {
    pub target_width: u32,
    pub target_height: u32,
    pub margin: u32,
}

/// Cut an upright crop of the region outlined by `points` (original-image
/// coordinates) out of `original`.
///
/// Returns `None` for degenerate regions.
pub fn rectify(original: &RgbImage, points: &[Point<i32>], params: RectifyParams) -> Option<RgbImage> {
    let rotated = RotatedBox::min_area(points)?.normalized();
    let width = rotated.width.round() as u32;
    let height = rotated.height.round() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let [bl, tl, tr, br] = rotated.corners();
    let (w, h) = (width as f32, height as f32);
    let projection = Projection::from_control_points(
        [tl, tr, br, bl],
        [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)],
    )?;

    let mut upright = RgbImage::new(width, height);
    warp_into(
        original,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut upright,
    );

    let scaled = scale_to_fit(&upright, params.target_width, params.target_height);
    trim(&scaled, params.margin)
}

/// Uniform resize so the crop fills the target frame along its limiting axis
fn scale_to_fit(image: &RgbImage, target_width: u32, target_height: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let factor = (target_width as f64 / w as f64).min(target_height as f64 / h as f64);
    let new_w = ((w as f64 * factor).round() as u32).max(1);
    let new_h = ((h as f64 * factor).round() as u32).max(1);
    if (new_w, new_h) == (w, h) {
        return image.clone();
    }
    imageops::resize(image, new_w, new_h, FilterType::CatmullRom)
}

fn trim(image: &RgbImage, margin: u32) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    if w <= 2 * margin || h <= 2 * margin {
        return None;
    }
    Some(imageops::crop_imm(image, margin, margin, w - 2 * margin, h - 2 * margin).to_image())
}
