//! Glyph isolation on binarized candidates

use crate::config::Settings;
use crate::detection::contours::{self, Shape};
use crate::geometry::{Crop, Rect};
use crate::preprocessing::steps::{edges, smooth, threshold};
use image::{imageops, GrayImage, Luma};

/// One character-sized region of the candidate
#[derive(Debug, Clone)]
pub struct Glyph {
    pub bounds: Rect<Crop>,
    pub image: GrayImage,
}

/// Glyphs of a candidate, ordered left to right, and the composite image
/// holding only their pixels on a white canvas
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub composite: GrayImage,
    pub glyphs: Vec<Glyph>,
}

pub fn segment(binary: &GrayImage, settings: &Settings) -> Option<Segmentation> {
    let smoothed = smooth::bilateral(
        binary,
        settings.bilateral_diameter,
        settings.bilateral_sigma_color,
        settings.bilateral_sigma_space,
    );
    let thresholds = threshold::auto(&smoothed, settings.auto_threshold_sigma);
    let edge_map = edges::apply(&smoothed, thresholds);

    let shapes: Vec<Shape<Crop>> = contours::shapes(&edge_map, settings.nested_duplicate_iou);
    let mut bounds: Vec<Rect<Crop>> = shapes
        .into_iter()
        .map(|shape| shape.bounds)
        .filter(|rect| is_glyph_shaped(rect, settings))
        .collect();
    bounds = outermost(bounds);

    if bounds.len() < settings.min_glyphs {
        tracing::debug!(glyphs = bounds.len(), required = settings.min_glyphs, "too few glyphs");
        return None;
    }

    bounds.sort_by_key(|rect| (rect.x, rect.y));

    let (width, height) = binary.dimensions();
    let mut composite = GrayImage::from_pixel(width, height, Luma([255]));
    let mut glyphs = Vec::with_capacity(bounds.len());
    for rect in bounds {
        let Some(rect) = rect.clamp_to(width, height) else {
            continue;
        };
        let (x, y) = (rect.x as u32, rect.y as u32);
        let image = imageops::crop_imm(binary, x, y, rect.width, rect.height).to_image();
        imageops::replace(&mut composite, &image, x as i64, y as i64);
        glyphs.push(Glyph { bounds: rect, image });
    }

    Some(Segmentation { composite, glyphs })
}

fn is_glyph_shaped(rect: &Rect<Crop>, settings: &Settings) -> bool {
    settings.glyph_aspect.contains(rect.aspect_ratio()) && rect.area() >= settings.glyph_min_area as u64
}

/// Drop regions lying inside another region, such as the counter of an `O`
/// or the inner trace of a glyph outline. A plate frame fails the glyph gate
/// before this point and so never hides the glyphs inside it.
fn outermost(rects: Vec<Rect<Crop>>) -> Vec<Rect<Crop>> {
    rects
        .iter()
        .enumerate()
        .filter(|(i, rect)| {
            !rects.iter().enumerate().any(|(j, other)| {
                j != *i && other.contains(rect) && (other.area() > rect.area() || j < *i)
            })
        })
        .map(|(_, rect)| *rect)
        .collect()
}
