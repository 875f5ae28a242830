use crate::error::LprError;
use image::GrayImage;
use serde::Serialize;
use std::path::PathBuf;

/// Default character set a plate can contain
pub const DEFAULT_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890 ";

/// How the recognizer should treat its input image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    /// A single uniform block of text
    WholeBlock,
    /// Exactly one character
    SingleChar,
}

/// Per-call recognizer configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizerConfig {
    /// Directory holding language data; `None` uses the download cache
    pub data_path: Option<PathBuf>,
    pub language_model: String,
    pub whitelist: String,
    pub page_mode: PageMode,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            language_model: "eng".to_string(),
            whitelist: DEFAULT_WHITELIST.to_string(),
            page_mode: PageMode::WholeBlock,
        }
    }
}

impl RecognizerConfig {
    pub fn with_page_mode(&self, page_mode: PageMode) -> Self {
        Self {
            page_mode,
            ..self.clone()
        }
    }

    /// Keep only whitelisted characters, upper-casing letters the whitelist
    /// only carries in upper case
    pub fn filter(&self, raw: &str) -> String {
        raw.chars()
            .filter_map(|c| {
                if self.whitelist.contains(c) {
                    Some(c)
                } else {
                    let upper = c.to_ascii_uppercase();
                    self.whitelist.contains(upper).then_some(upper)
                }
            })
            .collect()
    }
}

/// Trait that all text recognizers must implement.
///
/// Implementations carry no state between calls; everything that varies per
/// call arrives through `config`.
pub trait TextRecognizer: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the characters in `image`, concatenated in reading order
    fn recognize(&self, image: &GrayImage, config: &RecognizerConfig) -> Result<String, LprError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
