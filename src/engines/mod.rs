//! Text recognizer implementations
//!
//! This module contains implementations of the TextRecognizer trait for
//! different OCR backends. Engines are conditionally compiled based on feature
//! flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::engine::{RecognizerConfig, TextRecognizer};
use crate::error::LprError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Information about an available engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub supported_languages: Vec<String>,
}

/// Registry of available recognizers
pub struct EngineRegistry {
    engines: Vec<Arc<dyn TextRecognizer>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with all compiled-in engines initialized.
    ///
    /// Fails with `LprError::Initialization` when an engine cannot load its
    /// models or language data.
    #[cfg_attr(
        not(any(feature = "engine-ocrs", feature = "engine-leptess")),
        allow(unused_variables, unused_mut)
    )]
    pub fn new(config: &RecognizerConfig) -> Result<Self, LprError> {
        let mut engines: Vec<Arc<dyn TextRecognizer>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        Self::from_engines(engines)
    }

    /// Build a registry around already constructed recognizers; the first one
    /// becomes the default
    pub fn from_engines(engines: Vec<Arc<dyn TextRecognizer>>) -> Result<Self, LprError> {
        let default_engine = engines
            .first()
            .map(|e| e.name().to_string())
            .ok_or_else(|| {
                LprError::Initialization(
                    "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess"
                        .to_string(),
                )
            })?;

        Ok(Self {
            engines,
            default_engine,
        })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn TextRecognizer>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the default engine
    pub fn default(&self) -> Option<Arc<dyn TextRecognizer>> {
        self.get(&self.default_engine)
    }

    /// Get the default engine name
    pub fn default_name(&self) -> &str {
        &self.default_engine
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Get info about all available engines
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|e| EngineInfo {
                name: e.name(),
                description: e.description(),
                supported_languages: e.supported_languages(),
            })
            .collect()
    }
}

/// Cache directory for downloaded models and language data
#[cfg_attr(
    not(any(feature = "engine-ocrs", feature = "engine-leptess")),
    allow(dead_code)
)]
fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("plate-reader")
}

/// Return `dir/filename`, downloading it from `url` first when missing
#[cfg_attr(
    not(any(feature = "engine-ocrs", feature = "engine-leptess")),
    allow(dead_code)
)]
fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, LprError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        LprError::Initialization(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let path = dir.join(filename);
    if path.exists() {
        tracing::info!("Using cached {:?}", path);
        return Ok(path);
    }

    tracing::info!("Downloading {} (this may take a moment)...", filename);
    let response = ureq::get(url)
        .call()
        .map_err(|e| LprError::Initialization(format!("Failed to download {}: {}", filename, e)))?;
    let buffer = response.into_body().read_to_vec().map_err(|e| {
        LprError::Initialization(format!("Failed to read response for {}: {}", filename, e))
    })?;

    // Partial downloads never sit at the final path
    let partial = dir.join(format!("{}.part", filename));
    std::fs::write(&partial, &buffer)
        .and_then(|_| std::fs::rename(&partial, &path))
        .map_err(|e| LprError::Initialization(format!("Failed to write {}: {}", filename, e)))?;

    tracing::info!("Downloaded {} to {:?}", filename, path);
    Ok(path)
}
