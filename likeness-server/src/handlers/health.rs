//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Feature extractor behind the cosine score
    #[schema(example = "hog")]
    pub feature_model: &'static str,
    /// Metric behind the distance score
    #[schema(example = "ssim")]
    pub distance_metric: String,
    /// Whether `/generate_image` is mounted
    pub generation_enabled: bool,
}

/// Liveness check with the active comparison strategies
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "likeness-server",
        feature_model: state.comparator.extractor_name(),
        distance_metric: state.comparator.distance_metric().to_string(),
        generation_enabled: state.generator.is_some(),
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Readiness probe
///
/// Pings the database when one is configured; without a database the
/// service is ready as soon as it is listening.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to accept traffic", body = ReadyResponse),
        (status = 503, description = "Database unreachable", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if let Some(repo) = &state.image_repo {
        if let Err(e) = repo.ping().await {
            tracing::warn!(error = %e, "Readiness check failed: database unreachable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    message: Some("Database unreachable"),
                }),
            );
        }
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            message: None,
        }),
    )
}
