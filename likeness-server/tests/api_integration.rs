//! API integration tests for likeness-server.
//!
//! These tests drive the router with realistic multipart and JSON requests
//! and check response bodies as well as what is left on disk.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use likeness_core::{Comparator, ComparatorConfig, DistanceMetric, MockGenerator};
use likeness_server::{create_router, AppState, Config};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----TestBoundary7MA4YWxkTrZu0gW";

/// One part of a multipart body
struct Part<'a> {
    name: &'a str,
    file_name: &'a str,
    content_type: &'a str,
    data: &'a [u8],
}

/// Helper to create a multipart body from file parts
fn create_multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

fn compare_parts<'a>(first: &'a [u8], second: &'a [u8]) -> [Part<'a>; 2] {
    [
        Part {
            name: "file1",
            file_name: "first.png",
            content_type: "image/png",
            data: first,
        },
        Part {
            name: "file2",
            file_name: "second.png",
            content_type: "image/png",
            data: second,
        },
    ]
}

/// Encode a synthetic gradient image as PNG
fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        let b = if (x * 4 / width + y * 4 / height) % 2 == 0 { 200 } else { 40 };
        Rgb([r, g, b])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Test harness owning the temp directories the router writes into
struct TestApp {
    router: Router,
    uploads: TempDir,
    images: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with(ComparatorConfig::default(), false)
    }

    fn with(comparator: ComparatorConfig, generation: bool) -> Self {
        let uploads = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        let config = Config {
            upload_dir: uploads.path().to_path_buf(),
            images_dir: images.path().to_path_buf(),
            comparator,
            ..Config::default()
        };

        let comparator = Comparator::from_config(config.comparator).unwrap();
        let mut state = AppState::new(comparator, &config);
        if generation {
            state = state.with_generator(Arc::new(MockGenerator::default()));
        }

        Self {
            router: create_router(state),
            uploads,
            images,
        }
    }

    async fn compare(&self, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let (content_type, body) = create_multipart(parts);
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/compare/")
                    .header("Content-Type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        read_json(response).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_json(response).await
    }

    async fn generate(&self, prompt: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({ "prompt": prompt }).to_string();
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate_image")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new();
    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["feature_model"], "hog");
    assert_eq!(json["distance_metric"], "ssim");
    assert_eq!(json["generation_enabled"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_without_database() {
    let app = TestApp::new();
    let (status, json) = app.get("/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();
    let (status, json) = app.get("/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/compare/"].is_object());
}

// ============================================================================
// Compare Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_compare_identical_images() {
    let app = TestApp::new();
    let png = create_test_png(64, 64);

    let (status, json) = app.compare(&compare_parts(&png, &png)).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["phash_similarity"].as_f64(), Some(1.0));
    assert!((json["cosine_similarity"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert!((json["opencv_match"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert!((json["distance_score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert!(json.get("notes").is_none());
}

#[tokio::test]
async fn test_compare_different_sizes_returns_nulls() {
    let app = TestApp::new();
    let small = create_test_png(100, 100);
    let large = create_test_png(200, 200);

    let (status, json) = app.compare(&compare_parts(&small, &large)).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert!(json["opencv_match"].is_null());
    assert!(json["distance_score"].is_null());
    assert!(json["cosine_similarity"].is_number());
    assert!(json["phash_similarity"].is_number());
}

#[tokio::test]
async fn test_compare_with_inverse_mse() {
    let app = TestApp::with(
        ComparatorConfig {
            distance_metric: DistanceMetric::InverseMse,
            ..Default::default()
        },
        false,
    );
    let png = create_test_png(48, 48);

    let (status, json) = app.compare(&compare_parts(&png, &png)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["distance_score"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn test_compare_without_trailing_slash() {
    let app = TestApp::new();
    let png = create_test_png(32, 32);
    let (content_type, body) = create_multipart(&compare_parts(&png, &png));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/compare")
                .header("Content-Type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_compare_undecodable_image_is_server_error() {
    let app = TestApp::new();
    let png = create_test_png(32, 32);
    let parts = [
        Part {
            name: "file1",
            file_name: "good.png",
            content_type: "image/png",
            data: &png,
        },
        Part {
            name: "file2",
            file_name: "bad.png",
            content_type: "application/octet-stream",
            data: b"this is not an image",
        },
    ];

    let (status, json) = app.compare(&parts).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"].is_string());
    assert_eq!(json["code"], "IMAGE_LOAD_ERROR");
}

#[tokio::test]
async fn test_compare_missing_file_is_bad_request() {
    let app = TestApp::new();
    let png = create_test_png(32, 32);
    let parts = [Part {
        name: "file1",
        file_name: "only.png",
        content_type: "image/png",
        data: &png,
    }];

    let (status, json) = app.compare(&parts).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("file2"));
}

#[tokio::test]
async fn test_compare_rejects_non_image_content_type() {
    let app = TestApp::new();
    let png = create_test_png(32, 32);
    let parts = [
        Part {
            name: "file1",
            file_name: "page.html",
            content_type: "text/html",
            data: b"<html></html>",
        },
        Part {
            name: "file2",
            file_name: "b.png",
            content_type: "image/png",
            data: &png,
        },
    ];

    let (status, json) = app.compare(&parts).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_compare_leaves_no_temp_files() {
    let app = TestApp::new();
    let png = create_test_png(40, 40);

    let (status, _) = app.compare(&compare_parts(&png, &png)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dir_is_empty(app.uploads.path()), "success left files behind");

    let garbage = b"garbage bytes";
    let (status, _) = app.compare(&compare_parts(&png, garbage)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(dir_is_empty(app.uploads.path()), "failure left files behind");
}

// ============================================================================
// Generate Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_generate_not_mounted_when_disabled() {
    let app = TestApp::new();
    let (status, _) = app.generate("a red bicycle").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_saves_and_returns_image() {
    let app = TestApp::with(ComparatorConfig::default(), true);
    let (status, json) = app.generate("a red bicycle").await;

    assert_eq!(status, StatusCode::OK, "body: {json}");

    let filename = json["image_filename"].as_str().unwrap();
    assert!(filename.ends_with(".png"));
    assert_eq!(filename.len(), 32 + ".png".len());
    // Without a database no record is stored.
    assert!(json.get("record_id").is_none());

    let returned = BASE64
        .decode(json["image_base64"].as_str().unwrap())
        .unwrap();
    let saved = std::fs::read(app.images.path().join(filename)).unwrap();
    assert_eq!(returned, saved);
    assert!(image::load_from_memory(&saved).is_ok());
}

#[tokio::test]
async fn test_generate_rejects_empty_prompt() {
    let app = TestApp::with(ComparatorConfig::default(), true);
    let (status, json) = app.generate("   ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].is_string());
    assert!(dir_is_empty(app.images.path()));
}
