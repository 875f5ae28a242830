use crate::config::Settings;
use crate::error::LprError;
use crate::geometry::ResizeRatios;
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;
use super::steps::threshold::EdgeThresholds;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Output of the preprocessor: the edge map plus the resize ratios every
/// later stage needs to reach the original image
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Canny edge map at working resolution
    pub edges: GrayImage,
    pub ratios: ResizeRatios,
    pub thresholds: EdgeThresholds,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Grayscale, resize, threshold selection, Gaussian smoothing and edge
/// detection, in that order
pub struct Preprocessor<'a> {
    settings: &'a Settings,
}

impl<'a> Preprocessor<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn prepare(&self, image: &DynamicImage) -> Result<Prepared, LprError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(LprError::InvalidImage(format!(
                "zero-dimension image {}x{}",
                image.width(),
                image.height()
            )));
        }

        let start = Instant::now();
        let mut timings = Vec::new();
        let settings = self.settings;

        let gray = self.run_step("grayscale", &mut timings, || steps::grayscale::apply(image));

        let (working, ratios) = self.run_step("resize", &mut timings, || {
            steps::resize::to_working(&gray, settings.working_width, settings.working_height)
        });
        drop(gray);

        // Thresholds come from the resized frame before smoothing
        let thresholds =
            self.run_step("threshold", &mut timings, || steps::threshold::select(&working, settings));

        let smoothed = self.run_step("gaussian", &mut timings, || {
            steps::smooth::gaussian(&working, settings.kernel_size, settings.sigma)
        });

        let edges = self.run_step("canny", &mut timings, || steps::edges::apply(&smoothed, thresholds));

        Ok(Prepared {
            edges,
            ratios,
            thresholds,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        })
    }

    fn run_step<T, F>(&self, name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
    where
        F: FnOnce() -> T,
    {
        let step_start = Instant::now();
        let result = step_fn();
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!(step = name, time_ms, "preprocessing step finished");
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        result
    }
}
