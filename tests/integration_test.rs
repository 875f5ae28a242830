mod common;

use common::{blank_photo, pipeline_with, plate_photo, png_bytes, Script, ScriptedRecognizer};
use plate_reader::config::ServerConfig;
use plate_reader::engines::EngineRegistry;
use plate_reader::server::{self, AppState};
use plate_reader::{Settings, TextRecognizer};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Deserialize)]
struct RectResponse {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct PlateResponse {
    text: String,
    rect: RectResponse,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RecognizeResponse {
    plates: Vec<PlateResponse>,
    first_layer_candidates: usize,
    second_layer_candidates: usize,
    processing_time_ms: u64,
    engine: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EngineResponse {
    name: String,
    description: String,
    supported_languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    version: String,
    default_engine: String,
    available_engines: Vec<EngineResponse>,
    max_file_size_bytes: usize,
    settings: Settings,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ErrorResponse {
    error: String,
    code: String,
}

/// Router served on an ephemeral port for the lifetime of one test
struct TestServer {
    handle: JoinHandle<()>,
    base_url: String,
}

impl TestServer {
    async fn start(script: Script, max_file_size: usize) -> Self {
        let recognizer = ScriptedRecognizer::new(script);
        let registry = EngineRegistry::from_engines(vec![recognizer.clone() as Arc<dyn TextRecognizer>]).unwrap();
        let state = AppState {
            pipeline: Arc::new(pipeline_with(recognizer, Settings::default())),
            engines: Arc::new(registry.info()),
            config: Arc::new(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                max_file_size,
            }),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = server::router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            base_url: format!("http://{}", addr),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn upload(bytes: Vec<u8>, field: &str) -> Form {
    let part = Part::bytes(bytes)
        .file_name("car.png")
        .mime_str("image/png")
        .unwrap();
    Form::new().part(field.to_string(), part)
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start(Script::Text("KR 12345"), 20 * 1024 * 1024).await;

    let response: HealthResponse = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.status, "ok");
    assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_endpoint() {
    let server = TestServer::start(Script::Text("KR 12345"), 1024).await;

    let response: InfoResponse = reqwest::get(server.url("/info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(!response.version.is_empty());
    assert_eq!(response.default_engine, "scripted");
    assert_eq!(response.available_engines.len(), 1);
    assert_eq!(response.available_engines[0].name, "scripted");
    assert_eq!(response.max_file_size_bytes, 1024);
    assert_eq!(response.settings, Settings::default());
}

#[tokio::test]
async fn test_recognize_returns_plate_in_original_coordinates() {
    let server = TestServer::start(Script::Text("KR 12345"), 20 * 1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/recognize"))
        .multipart(upload(png_bytes(&plate_photo()), "file"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success(), "status {}", response.status());

    let result: RecognizeResponse = response.json().await.unwrap();
    assert_eq!(result.engine, "scripted");
    assert_eq!(result.first_layer_candidates, 1);
    assert_eq!(result.second_layer_candidates, 1);
    assert_eq!(result.plates.len(), 1);

    let plate = &result.plates[0];
    assert_eq!(plate.text, "KR 12345");
    assert!((plate.rect.x - 400).abs() <= 8);
    assert!((plate.rect.y - 500).abs() <= 8);
    assert!(plate.rect.width.abs_diff(450) <= 12);
    assert!(plate.rect.height.abs_diff(100) <= 12);
}

#[tokio::test]
async fn test_recognize_blank_image_finds_nothing() {
    let server = TestServer::start(Script::Text("KR 12345"), 20 * 1024 * 1024).await;
    let client = reqwest::Client::new();

    let result: RecognizeResponse = client
        .post(server.url("/recognize"))
        .multipart(upload(png_bytes(&blank_photo()), "file"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(result.plates.is_empty());
    assert_eq!(result.first_layer_candidates, 0);
}

#[tokio::test]
async fn test_recognize_without_file_field_is_bad_request() {
    let server = TestServer::start(Script::Text("KR 12345"), 20 * 1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/recognize"))
        .multipart(upload(png_bytes(&plate_photo()), "image"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "MISSING_FILE");
}

#[tokio::test]
async fn test_recognize_undecodable_upload_is_unprocessable() {
    let server = TestServer::start(Script::Text("KR 12345"), 20 * 1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/recognize"))
        .multipart(upload(b"definitely not an image".to_vec(), "file"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "INVALID_IMAGE");
}

#[tokio::test]
async fn test_recognize_oversized_upload_is_rejected() {
    let server = TestServer::start(Script::Text("KR 12345"), 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/recognize"))
        .multipart(upload(vec![0u8; 4096], "file"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "IMAGE_TOO_LARGE");
}
