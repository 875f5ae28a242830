//! Per-image stage threading.
//!
//! Each stage consumes the previous stage's result and returns a new value;
//! the results are gathered into an [`ImageReport`] for persistence.

use crate::config::Settings;
use crate::detection::{self, FirstLayerCandidate};
use crate::engine::{PageMode, RecognizerConfig, TextRecognizer};
use crate::error::LprError;
use crate::geometry::{Original, Rect, ResizeRatios, Working};
use crate::grammar::PlateGrammar;
use crate::merge::merge_by;
use crate::overlay::OverlayRenderer;
use crate::preprocessing::{Preprocessor, StepTiming};
use crate::segmentation::{self, Segmentation};
use crate::validation::{self, SecondLayerCandidate};
use ab_glyph::FontVec;
use image::{DynamicImage, GrayImage, RgbImage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// A candidate whose recognized text passed the plate grammar
#[derive(Debug, Clone)]
pub struct AcceptedPlate {
    pub position: Rect<Working>,
    pub original_position: Rect<Original>,
    pub text: String,
    /// Glyph composite handed to the recognizer
    pub glyph_image: GrayImage,
}

/// Serializable summary of one accepted plate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateReading {
    pub text: String,
    pub rect: Rect<Original>,
}

/// Everything one image produced, tier by tier
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub ratios: ResizeRatios,
    pub edges: GrayImage,
    /// Edge map with accepted candidate rectangles drawn on it
    pub contours: RgbImage,
    pub first_layer: Vec<FirstLayerCandidate>,
    pub second_layer: Vec<SecondLayerCandidate>,
    pub plates: Vec<AcceptedPlate>,
    pub annotated: RgbImage,
    pub steps: Vec<StepTiming>,
    pub processing_time_ms: u64,
}

impl ImageReport {
    pub fn readings(&self) -> Vec<PlateReading> {
        self.plates
            .iter()
            .map(|plate| PlateReading {
                text: plate.text.clone(),
                rect: plate.original_position,
            })
            .collect()
    }
}

/// The full detection and recognition chain, configured once per run
pub struct PlatePipeline {
    settings: Settings,
    recognizer: Arc<dyn TextRecognizer>,
    recognizer_config: RecognizerConfig,
    grammar: PlateGrammar,
    renderer: OverlayRenderer,
}

impl PlatePipeline {
    pub fn new(
        settings: Settings,
        recognizer: Arc<dyn TextRecognizer>,
        recognizer_config: RecognizerConfig,
        font: Option<FontVec>,
    ) -> Result<Self, LprError> {
        settings.validate()?;
        let grammar = PlateGrammar::new(&settings.denied_first_chars)?;
        Ok(Self {
            settings,
            recognizer,
            recognizer_config,
            grammar,
            renderer: OverlayRenderer::new(font),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Run every stage on `image`.
    ///
    /// Rejected candidates are simply absent from the report. Only invalid
    /// input and fatal recognizer failures surface as errors.
    pub fn process(&self, image: &DynamicImage) -> Result<ImageReport, LprError> {
        let start = Instant::now();
        let settings = &self.settings;

        let prepared = Preprocessor::new(settings).prepare(image)?;
        let original = image.to_rgb8();

        let detection = detection::detect(&prepared.edges, &original, prepared.ratios, settings);

        let second_layer: Vec<SecondLayerCandidate> = detection
            .candidates
            .iter()
            .filter_map(|candidate| validation::validate(candidate, settings))
            .collect();

        let mut readings = Vec::new();
        for candidate in &second_layer {
            let Some(segmentation) = segmentation::segment(&candidate.binary, settings) else {
                continue;
            };
            let raw = match self.read(&segmentation) {
                Ok(raw) => raw,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(x = candidate.position.x, y = candidate.position.y, "recognition failed: {}", e);
                    continue;
                }
            };
            let Some(text) = self.grammar.validate(&raw) else {
                continue;
            };
            readings.push(AcceptedPlate {
                position: candidate.position,
                original_position: candidate.original_position,
                text,
                glyph_image: segmentation.composite,
            });
        }

        let plates = merge_by(readings, |plate| plate.text.as_str());
        let annotated = self.renderer.render(&original, &plates, prepared.ratios);

        tracing::debug!(
            preprocess_ms = prepared.total_time_ms,
            first_layer = detection.candidates.len(),
            second_layer = second_layer.len(),
            plates = plates.len(),
            "image processed"
        );

        Ok(ImageReport {
            ratios: prepared.ratios,
            edges: prepared.edges,
            contours: detection.overlay,
            first_layer: detection.candidates,
            second_layer,
            plates,
            annotated,
            steps: prepared.steps,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Whole-block recognition of the composite, or glyph-by-glyph
    /// single-character recognition in the split variant
    fn read(&self, segmentation: &Segmentation) -> Result<String, LprError> {
        if !self.settings.split_glyphs {
            let config = self.recognizer_config.with_page_mode(PageMode::WholeBlock);
            return self.recognizer.recognize(&segmentation.composite, &config);
        }

        let config = self.recognizer_config.with_page_mode(PageMode::SingleChar);
        let mut text = String::new();
        for glyph in &segmentation.glyphs {
            let character = self.recognizer.recognize(&glyph.image, &config)?;
            text.push_str(character.trim());
        }
        Ok(text)
    }
}
