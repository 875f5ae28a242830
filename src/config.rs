use crate::error::LprError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive acceptance band for a measured value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Processing settings shared by every stage of a run.
///
/// Every numeric acceptance band is a tunable default. A settings file only
/// needs to name the fields it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gaussian kernel size (odd, pixels)
    pub kernel_size: u32,
    /// Gaussian sigma
    pub sigma: f32,
    /// Derive edge thresholds from the mean intensity instead of the fixed pair
    pub use_auto_threshold: bool,
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Spread around the mean intensity used by the automatic threshold pair
    pub auto_threshold_sigma: f64,
    pub working_width: u32,
    pub working_height: u32,

    /// Width/height band of a plate-shaped bounding rectangle
    pub plate_aspect: Band,
    /// A hole border whose bounds overlap its parent's by at least this IoU
    /// traces the same edge ring and is not emitted again
    pub nested_duplicate_iou: f64,
    /// Pixels trimmed from each side of a rectified crop
    pub crop_margin: u32,

    /// Fractional start/end of the central window used for colour statistics
    pub inset_start: f64,
    pub inset_end: f64,
    pub saturation_band: Band,
    pub value_band: Band,
    pub require_bright: bool,
    pub bright_cutoff: u8,
    pub bright_fraction: f64,
    /// Contrast boost applied before binarization
    pub binarize_contrast: f32,
    /// HSV value above which a pixel counts as plate background
    pub binarize_value_threshold: u8,

    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    pub glyph_aspect: Band,
    pub glyph_min_area: u32,
    pub min_glyphs: usize,
    /// Recognize glyphs one by one instead of the composite image
    pub split_glyphs: bool,

    /// First characters dropped as frame artifacts
    pub denied_first_chars: Vec<char>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 1.4,
            use_auto_threshold: true,
            low_threshold: 50.0,
            high_threshold: 150.0,
            auto_threshold_sigma: 0.33,
            working_width: 800,
            working_height: 600,

            plate_aspect: Band::new(2.0, 5.0),
            nested_duplicate_iou: 0.85,
            crop_margin: 2,

            inset_start: 0.3,
            inset_end: 0.7,
            saturation_band: Band::new(0.0, 85.0),
            value_band: Band::new(100.0, 255.0),
            require_bright: true,
            bright_cutoff: 150,
            bright_fraction: 0.5,
            binarize_contrast: 15.0,
            binarize_value_threshold: 100,

            bilateral_diameter: 11,
            bilateral_sigma_color: 20.0,
            bilateral_sigma_space: 10.0,
            glyph_aspect: Band::new(0.06, 1.5),
            glyph_min_area: 400,
            min_glyphs: 5,
            split_glyphs: false,

            denied_first_chars: vec!['H', 'I', 'J', 'M', 'U', 'V', 'Y'],
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, LprError> {
        let raw = std::fs::read_to_string(path).map_err(|e| LprError::io(path, e))?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| LprError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), LprError> {
        if self.working_width == 0 || self.working_height == 0 {
            return Err(LprError::Config(
                "working resolution must be non-zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.inset_start)
            || !(0.0..=1.0).contains(&self.inset_end)
            || self.inset_start >= self.inset_end
        {
            return Err(LprError::Config(format!(
                "invalid validator inset {}..{}",
                self.inset_start, self.inset_end
            )));
        }
        if self.sigma <= 0.0 {
            return Err(LprError::Config("gaussian sigma must be positive".to_string()));
        }
        if self.bilateral_sigma_color <= 0.0 || self.bilateral_sigma_space <= 0.0 {
            return Err(LprError::Config(format!(
                "bilateral sigmas must be positive (colour {}, space {})",
                self.bilateral_sigma_color, self.bilateral_sigma_space
            )));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
}
