//! Colour-histogram classification of first-layer candidates

use crate::config::Settings;
use crate::detection::FirstLayerCandidate;
use crate::geometry::{Original, Rect, Working};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::stats::histogram;
use palette::{FromColor, Hsv, Srgb};

/// A candidate that passed colour validation, binarized for segmentation
#[derive(Debug, Clone)]
pub struct SecondLayerCandidate {
    pub position: Rect<Working>,
    pub original_position: Rect<Original>,
    /// Light background as 255, dark glyphs as 0
    pub binary: GrayImage,
}

/// Histogram statistics of the central window of a crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStats {
    pub saturation_mean: f64,
    pub value_mean: f64,
    /// Fraction of value mass above the bright cutoff
    pub bright_fraction: f64,
}

impl ColorStats {
    pub fn measure(crop: &RgbImage, settings: &Settings) -> Option<Self> {
        let window = inner_window(crop, settings.inset_start, settings.inset_end)?;
        let (saturation, value) = split_saturation_value(&window);

        let saturation_hist = histogram(&saturation).channels[0];
        let value_hist = histogram(&value).channels[0];

        Some(Self {
            saturation_mean: weighted_mean(&saturation_hist),
            value_mean: weighted_mean(&value_hist),
            bright_fraction: mass_above(&value_hist, settings.bright_cutoff),
        })
    }

    pub fn is_plate_background(&self, settings: &Settings) -> bool {
        settings.saturation_band.contains(self.saturation_mean)
            && settings.value_band.contains(self.value_mean)
            && (!settings.require_bright || self.bright_fraction > settings.bright_fraction)
    }
}

/// Keep `candidate` when its centre looks like a plate background and
/// binarize it.
pub fn validate(candidate: &FirstLayerCandidate, settings: &Settings) -> Option<SecondLayerCandidate> {
    let Some(stats) = ColorStats::measure(&candidate.crop, settings) else {
        tracing::debug!(x = candidate.position.x, y = candidate.position.y, "crop too small for histogram");
        return None;
    };

    if !stats.is_plate_background(settings) {
        tracing::debug!(
            x = candidate.position.x,
            y = candidate.position.y,
            saturation = stats.saturation_mean,
            value = stats.value_mean,
            bright = stats.bright_fraction,
            "histogram rejected candidate"
        );
        return None;
    }

    Some(SecondLayerCandidate {
        position: candidate.position,
        original_position: candidate.original_position,
        binary: binarize(&candidate.crop, settings),
    })
}

/// Contrast boost followed by a threshold on HSV value
pub fn binarize(crop: &RgbImage, settings: &Settings) -> GrayImage {
    let boosted = imageops::contrast(crop, settings.binarize_contrast);
    let threshold = settings.binarize_value_threshold;
    GrayImage::from_fn(boosted.width(), boosted.height(), |x, y| {
        let [r, g, b] = boosted.get_pixel(x, y).0;
        if r.max(g).max(b) > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

fn inner_window(crop: &RgbImage, start: f64, end: f64) -> Option<RgbImage> {
    let (w, h) = crop.dimensions();
    let x0 = (w as f64 * start) as u32;
    let y0 = (h as f64 * start) as u32;
    let x1 = (w as f64 * end) as u32;
    let y1 = (h as f64 * end) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(imageops::crop_imm(crop, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// Saturation and value planes scaled to 0..=255
fn split_saturation_value(image: &RgbImage) -> (GrayImage, GrayImage) {
    let (w, h) = image.dimensions();
    let mut saturation = GrayImage::new(w, h);
    let mut value = GrayImage::new(w, h);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
        saturation.put_pixel(x, y, Luma([(hsv.saturation * 255.0).round() as u8]));
        value.put_pixel(x, y, Luma([(hsv.value * 255.0).round() as u8]));
    }
    (saturation, value)
}

fn weighted_mean(hist: &[u32; 256]) -> f64 {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let weighted: u64 = hist.iter().enumerate().map(|(i, &c)| i as u64 * c as u64).sum();
    weighted as f64 / total as f64
}

fn mass_above(hist: &[u32; 256], cutoff: u8) -> f64 {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let above: u64 = hist[cutoff as usize + 1..].iter().map(|&c| c as u64).sum();
    above as f64 / total as f64
}
