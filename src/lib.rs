//! License plate detection and recognition for photographs.
//!
//! An image flows through [`preprocessing`], [`detection`], [`validation`],
//! [`segmentation`], a [`engine::TextRecognizer`], the [`grammar`] check and
//! [`merge`], then [`overlay`] draws the surviving plates. [`pipeline`]
//! chains the stages for one image and [`batch`] runs whole directories.

pub mod batch;
pub mod config;
pub mod detection;
pub mod engine;
pub mod engines;
pub mod error;
pub mod geometry;
pub mod grammar;
pub mod merge;
pub mod overlay;
pub mod pipeline;
pub mod preprocessing;
pub mod segmentation;
pub mod server;
pub mod validation;

pub use config::Settings;
pub use engine::{PageMode, RecognizerConfig, TextRecognizer};
pub use error::LprError;
pub use pipeline::{AcceptedPlate, ImageReport, PlatePipeline, PlateReading};
