use crate::config::Settings;
use image::GrayImage;

/// Lower/upper hysteresis thresholds for edge detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    pub lower: f32,
    pub upper: f32,
}

/// Threshold pair derived from the mean intensity:
/// lower = max(0, (1 - sigma) * mean), upper = min(255, (1 + sigma) * mean)
pub fn auto(image: &GrayImage, sigma: f64) -> EdgeThresholds {
    let mean = mean_intensity(image);
    EdgeThresholds {
        lower: ((1.0 - sigma) * mean).max(0.0) as f32,
        upper: ((1.0 + sigma) * mean).min(255.0) as f32,
    }
}

/// Pick the automatic or the fixed pair according to the settings
pub fn select(image: &GrayImage, settings: &Settings) -> EdgeThresholds {
    if settings.use_auto_threshold {
        auto(image, settings.auto_threshold_sigma)
    } else {
        EdgeThresholds {
            lower: settings.low_threshold,
            upper: settings.high_threshold,
        }
    }
}

fn mean_intensity(image: &GrayImage) -> f64 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    sum as f64 / count as f64
}
