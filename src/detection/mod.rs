//! Plate-shaped candidate regions from the working-resolution edge map

pub mod contours;
pub mod rectify;

use crate::config::Settings;
use crate::geometry::{Original, Rect, ResizeRatios, Working};
use contours::Shape;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::point::Point;
use rectify::RectifyParams;

const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// A plate-shaped region that passed the geometry gate
#[derive(Debug, Clone)]
pub struct FirstLayerCandidate {
    pub position: Rect<Working>,
    pub original_position: Rect<Original>,
    /// Rectified colour crop cut from the original image
    pub crop: RgbImage,
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub candidates: Vec<FirstLayerCandidate>,
    /// Edge map with every accepted bounding rectangle drawn in green
    pub overlay: RgbImage,
}

/// Find plate-shaped contours in `edges` and cut a rectified crop for each
/// out of `original`.
pub fn detect(
    edges: &GrayImage,
    original: &RgbImage,
    ratios: ResizeRatios,
    settings: &Settings,
) -> Detection {
    let mut overlay = DynamicImage::ImageLuma8(edges.clone()).into_rgb8();
    let params = RectifyParams {
        target_width: settings.working_width,
        target_height: settings.working_height,
        margin: settings.crop_margin,
    };

    let shapes: Vec<Shape<Working>> = contours::shapes(edges, settings.nested_duplicate_iou);
    tracing::debug!(contours = shapes.len(), "traced edge map");

    let mut candidates = Vec::new();
    for shape in shapes {
        if !shape.is_polygon_like() {
            continue;
        }
        let aspect = shape.bounds.aspect_ratio();
        if !settings.plate_aspect.contains(aspect) {
            continue;
        }

        draw_hollow_rect_mut(&mut overlay, shape.bounds.to_imageproc(), OVERLAY_COLOR);

        let scaled: Vec<Point<i32>> = shape.points.iter().map(|&p| ratios.scale_point(p)).collect();
        let Some(crop) = rectify::rectify(original, &scaled, params) else {
            tracing::debug!(x = shape.bounds.x, y = shape.bounds.y, "degenerate rotated box");
            continue;
        };

        candidates.push(FirstLayerCandidate {
            position: shape.bounds,
            original_position: ratios.to_original(&shape.bounds),
            crop,
        });
    }

    Detection {
        candidates,
        overlay,
    }
}
