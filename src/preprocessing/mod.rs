//! Edge-map preparation for plate detection
//!
//! Turns a source photograph into a working-resolution edge map and records
//! the resize ratios needed to map detections back onto the original.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Prepared, Preprocessor, StepTiming};
pub use steps::threshold::EdgeThresholds;
