//! Directory batch runs: enumeration, bounded-concurrency processing and
//! artifact persistence

use crate::error::LprError;
use crate::pipeline::{ImageReport, PlatePipeline, PlateReading};
use futures::stream::{self, StreamExt};
use image::{DynamicImage, ImageBuffer, Pixel};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

pub const DEFAULT_WORKERS: usize = 16;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    /// Root for artifacts; `None` skips persistence
    pub output_dir: Option<PathBuf>,
    pub recursive: bool,
    pub workers: usize,
}

/// Deterministic artifact locations under one output root
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn edges(&self, name: &str) -> PathBuf {
        self.root.join("processed").join(format!("{}_edges.png", name))
    }

    pub fn contours(&self, name: &str) -> PathBuf {
        self.root.join("contours").join(format!("{}_contours.png", name))
    }

    pub fn first_layer(&self, name: &str, index: usize) -> PathBuf {
        self.root.join("first_layer").join(name).join(format!("{}.png", index))
    }

    pub fn second_layer(&self, name: &str, index: usize) -> PathBuf {
        self.root.join("second_layer").join(name).join(format!("{}.png", index))
    }

    pub fn plate(&self, name: &str, index: usize) -> PathBuf {
        self.root.join("plates").join(name).join(format!("{}.png", index))
    }

    pub fn result(&self, name: &str) -> PathBuf {
        self.root.join("result").join(format!("{}_result.png", name))
    }
}

/// Outcome for one processed image
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub file: PathBuf,
    pub plates: Vec<PlateReading>,
    pub first_layer_candidates: usize,
    pub second_layer_candidates: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedImage {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub images: Vec<ImageSummary>,
    pub skipped: Vec<SkippedImage>,
}

/// Image files directly inside `dir` (or anywhere below it when
/// `recursive`), sorted by path
pub fn list_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, LprError> {
    let walker = WalkDir::new(dir).min_depth(1);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(source) => LprError::io(path, source),
                None => LprError::InvalidRequest(format!("Filesystem loop at {}", path.display())),
            }
        })?;
        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Artifact key for `path`: its path below `input_dir` without extension,
/// with separators flattened so nested inputs cannot collide
pub fn artifact_name(input_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(input_dir).unwrap_or(path);
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("_")
}

/// Write every artifact of `report` under `paths`, overwriting existing files
pub fn persist(report: &ImageReport, name: &str, paths: &ArtifactPaths) -> Result<(), LprError> {
    save(&report.edges, &paths.edges(name))?;
    save(&report.contours, &paths.contours(name))?;
    for (i, candidate) in report.first_layer.iter().enumerate() {
        save(&candidate.crop, &paths.first_layer(name, i))?;
    }
    for (i, candidate) in report.second_layer.iter().enumerate() {
        save(&candidate.binary, &paths.second_layer(name, i))?;
    }
    for (i, plate) in report.plates.iter().enumerate() {
        save(&plate.glyph_image, &paths.plate(name, i))?;
    }
    save(&report.annotated, &paths.result(name))
}

fn save<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, path: &Path) -> Result<(), LprError>
where
    P: Pixel<Subpixel = u8> + image::PixelWithColorType,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LprError::io(parent, e))?;
    }
    image.save(path)?;
    Ok(())
}

/// Load, process and (optionally) persist one image
pub fn process_file(
    pipeline: &PlatePipeline,
    input_dir: &Path,
    path: &Path,
    artifacts: Option<&ArtifactPaths>,
) -> Result<ImageSummary, LprError> {
    let image: DynamicImage = image::open(path)?;
    let report = pipeline.process(&image)?;
    drop(image);

    if let Some(paths) = artifacts {
        persist(&report, &artifact_name(input_dir, path), paths)?;
    }

    let summary = ImageSummary {
        file: path.to_path_buf(),
        plates: report.readings(),
        first_layer_candidates: report.first_layer.len(),
        second_layer_candidates: report.second_layer.len(),
        processing_time_ms: report.processing_time_ms,
    };

    tracing::info!(
        file = %path.display(),
        first_layer = summary.first_layer_candidates,
        second_layer = summary.second_layer_candidates,
        plates = ?summary.plates.iter().map(|p| p.text.as_str()).collect::<Vec<_>>(),
        time_ms = summary.processing_time_ms,
        "processed image"
    );

    Ok(summary)
}

/// Process every image of `options.input_dir` on a bounded worker pool.
///
/// Per-image failures are logged and recorded as skipped. A fatal error
/// stops the run and is returned.
pub async fn run(pipeline: Arc<PlatePipeline>, options: BatchOptions) -> Result<BatchSummary, LprError> {
    let files = list_images(&options.input_dir, options.recursive)?;
    let workers = options.workers.max(1);
    tracing::info!(
        "Processing {} images from {:?} with {} workers",
        files.len(),
        options.input_dir,
        workers
    );

    let artifacts = options.output_dir.clone().map(ArtifactPaths::new);
    let input_dir = Arc::new(options.input_dir.clone());

    let mut results = stream::iter(files)
        .map(|path| {
            let pipeline = pipeline.clone();
            let artifacts = artifacts.clone();
            let input_dir = input_dir.clone();
            async move {
                let worker_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    process_file(&pipeline, &input_dir, &worker_path, artifacts.as_ref())
                })
                .await;
                // A panicking worker loses only its own image
                let outcome = joined.unwrap_or_else(|e| {
                    Err(LprError::Internal(format!("Worker task failed: {}", e)))
                });
                (path, outcome)
            }
        })
        .buffer_unordered(workers);

    let mut summary = BatchSummary::default();
    while let Some((path, outcome)) = results.next().await {
        match outcome {
            Ok(image) => summary.images.push(image),
            Err(e) if e.is_fatal() => {
                tracing::error!(file = %path.display(), "aborting batch: {}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), "skipping image: {}", e);
                summary.skipped.push(SkippedImage {
                    file: path,
                    reason: e.to_string(),
                });
            }
        }
    }

    summary.images.sort_by(|a, b| a.file.cmp(&b.file));
    summary.skipped.sort_by(|a, b| a.file.cmp(&b.file));
    tracing::info!(
        "Batch finished: {} processed, {} skipped",
        summary.images.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
