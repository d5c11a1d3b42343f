//! Image generation handler
//!
//! Handles POST /generate_image requests by proxying the prompt to the
//! configured generator and saving the returned image.

use std::path::Path;

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{CreateGeneratedImage, GeneratedImageRepository, GenerationStatus};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for image generation
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Text prompt describing the image
    #[schema(example = "a watercolor lighthouse at dusk")]
    pub prompt: String,
}

/// Response for a generated image
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    /// File name under the images directory
    #[schema(example = "3f2a9c0e5b7d4e1f8a6b2c9d0e1f2a3b.png")]
    pub image_filename: String,
    /// Base64-encoded image bytes
    pub image_base64: String,
    /// Id of the stored record, when a database is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// Generate an image from a text prompt
///
/// The image is saved under a random hex file name and returned inline as
/// base64. Upstream failures are reported without their details.
#[utoipa::path(
    post,
    path = "/generate_image",
    tag = "Generation",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated image", body = GenerateResponse),
        (status = 400, description = "Empty prompt"),
        (status = 500, description = "Failed to generate image."),
        (status = 503, description = "Generation not configured")
    )
)]
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Image generation not configured"))?;

    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("Prompt must not be empty"));
    }

    // No prompt table exists, so each request gets its own prompt id.
    let prompt_id = Uuid::new_v4().to_string();
    tracing::info!(
        prompt_id = %prompt_id,
        generator = generator.name(),
        prompt_len = prompt.len(),
        "Generating image"
    );

    let image = match generator.generate(prompt).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Some(repo) = &state.image_repo {
                record(repo, &prompt_id, None, GenerationStatus::Failed).await;
            }
            return Err(e.into());
        }
    };

    let image_filename = format!("{}.png", Uuid::new_v4().simple());
    save_image(&state.images_dir, &image_filename, &image).await?;

    let record_id = match &state.image_repo {
        Some(repo) => {
            let url = format!("/images/{}", image_filename);
            record(repo, &prompt_id, Some(url), GenerationStatus::Completed).await
        }
        None => None,
    };

    tracing::info!(
        prompt_id = %prompt_id,
        file = %image_filename,
        bytes = image.len(),
        "Image generated"
    );

    Ok(Json(GenerateResponse {
        image_filename,
        image_base64: BASE64.encode(&image),
        record_id,
    }))
}

async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create images directory: {}", e)))?;
    tokio::fs::write(dir.join(file_name), bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save generated image: {}", e)))
}

/// Store a record; a database failure is logged and does not fail the request.
async fn record(
    repo: &GeneratedImageRepository,
    prompt_id: &str,
    image_url: Option<String>,
    status: GenerationStatus,
) -> Option<String> {
    let input = CreateGeneratedImage {
        prompt_id: prompt_id.to_string(),
        image_url,
        thumbnail_url: None,
        generation_status: status,
    };

    match repo.create(input).await {
        Ok(record) => Some(record.id),
        Err(e) => {
            tracing::error!(prompt_id = %prompt_id, error = %e, "Failed to store generated image record");
            None
        }
    }
}
