//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based recognizer using the tesseract-static crate for static
//! linking (no system dependencies). Downloads tessdata (training data)
//! automatically on first use unless a data path is configured.

use crate::engine::{PageMode, RecognizerConfig, TextRecognizer};
use crate::error::LprError;
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Resolution hint for plate crops, which carry no DPI metadata
const PLATE_DPI: &str = "70";

/// Tesseract recognizer
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
}

impl LeptessEngine {
    /// Resolve tessdata for `config.language_model` and check that Tesseract
    /// can start with it
    pub fn new(config: &RecognizerConfig) -> Result<Self, LprError> {
        let language = &config.language_model;
        let tessdata_dir = match &config.data_path {
            Some(dir) => {
                let traineddata = dir.join(format!("{}.traineddata", language));
                if !traineddata.exists() {
                    return Err(LprError::Initialization(format!(
                        "Missing language data {:?}",
                        traineddata
                    )));
                }
                dir.clone()
            }
            None => ensure_tessdata_available(language)?,
        };

        let tessdata_path = tessdata_dir
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| LprError::Initialization("Invalid tessdata path".to_string()))?;

        // Test initialization; the instance is dropped straight away
        Tesseract::new(Some(&tessdata_path), Some(language)).map_err(|e| {
            LprError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self { tessdata_path })
    }
}

impl TextRecognizer for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - honours whitelist and page segmentation mode"
    }

    fn recognize(&self, image: &GrayImage, config: &RecognizerConfig) -> Result<String, LprError> {
        let rgb_img = DynamicImage::ImageLuma8(image.clone()).into_rgb8();
        let (width, height) = rgb_img.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| LprError::Recognition(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Recognizing {}x{} image, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let page_seg_mode = match config.page_mode {
            PageMode::WholeBlock => "6",
            PageMode::SingleChar => "10",
        };

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&config.language_model))
            .map_err(|e| LprError::Initialization(format!("Failed to create Tesseract: {}", e)))?;

        for (name, value) in [
            ("tessedit_char_whitelist", config.whitelist.as_str()),
            ("tessedit_pageseg_mode", page_seg_mode),
            ("user_defined_dpi", PLATE_DPI),
        ] {
            tess = tess.set_variable(name, value).map_err(|e| {
                LprError::Initialization(format!("Failed to set {}: {}", name, e))
            })?;
        }

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            LprError::Recognition(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| LprError::Recognition(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| LprError::Recognition(format!("Failed to get text: {}", e)))?;

        Ok(text.trim().to_string())
    }

    fn supported_languages(&self) -> Vec<String> {
        // Plate grammar is Latin letters and digits
        vec!["eng".to_string()]
    }
}

/// Ensure tessdata is available in the cache, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<PathBuf, LprError> {
    let cache_dir = super::cache_dir().join("tessdata");
    let traineddata_file = format!("{}.traineddata", language);
    super::ensure_downloaded(&tessdata_url(language), &cache_dir, &traineddata_file)?;

    // Tesseract expects the directory, not the file
    Ok(cache_dir)
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
