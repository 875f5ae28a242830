use crate::config::{ServerConfig, Settings};
use crate::engines::EngineInfo;
use crate::error::LprError;
use crate::pipeline::{PlatePipeline, PlateReading};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PlatePipeline>,
    pub engines: Arc<Vec<EngineInfo>>,
    pub config: Arc<ServerConfig>,
}

/// Recognition response
#[derive(Serialize)]
pub struct RecognizeResponse {
    pub plates: Vec<PlateReading>,
    pub first_layer_candidates: usize,
    pub second_layer_candidates: usize,
    pub processing_time_ms: u64,
    pub engine: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub settings: Settings,
}

pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/recognize", post(handle_recognize))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Leave room for multipart framing around the file itself
                .layer(DefaultBodyLimit::max(max_file_size.saturating_add(64 * 1024))),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle recognition requests
async fn handle_recognize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RecognizeResponse>, LprError> {
    let start = Instant::now();

    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LprError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() == Some("file") {
            file_data = Some(field.bytes().await.map_err(|e| {
                LprError::InvalidRequest(format!("Failed to read file data: {}", e))
            })?);
        }
    }

    let data = file_data.ok_or(LprError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(LprError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&data)?;
        pipeline.process(&image)
    })
    .await
    .map_err(|e| LprError::Internal(format!("Recognition task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    let plates = report.readings();

    tracing::info!(
        "Recognition completed in {}ms, candidates: {}/{}, plates: {}",
        processing_time_ms,
        report.first_layer.len(),
        report.second_layer.len(),
        plates.len()
    );

    Ok(Json(RecognizeResponse {
        plates,
        first_layer_candidates: report.first_layer.len(),
        second_layer_candidates: report.second_layer.len(),
        processing_time_ms,
        engine: state.pipeline.recognizer_name().to_string(),
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_engine: state.pipeline.recognizer_name().to_string(),
        available_engines: state.engines.as_ref().clone(),
        max_file_size_bytes: state.config.max_file_size,
        settings: state.pipeline.settings().clone(),
    })
}
