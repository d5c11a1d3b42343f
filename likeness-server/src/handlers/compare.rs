//! Image comparison handler
//!
//! Handles POST /compare/ requests scoring two uploaded images.

use axum::{
    extract::{Multipart, State},
    Json,
};
use likeness_core::ComparisonResult;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;
use crate::upload::TempUpload;

/// Multipart field names for the two images
const FILE_FIELDS: [&str; 2] = ["file1", "file2"];

/// Scores for one pair of images
#[derive(Debug, Serialize, ToSchema)]
pub struct CompareResponse {
    /// Cosine similarity of the two feature vectors
    #[schema(example = 0.9731)]
    pub cosine_similarity: f64,
    /// Normalized correlation coefficient; null when sizes differ
    #[schema(example = 0.9412)]
    pub opencv_match: Option<f64>,
    /// SSIM or inverse-MSE similarity; null when sizes differ
    #[schema(example = 0.8877)]
    pub distance_score: Option<f64>,
    /// Perceptual hash similarity in [0, 1]
    #[schema(example = 0.9375)]
    pub phash_similarity: f64,
}

impl From<ComparisonResult> for CompareResponse {
    fn from(result: ComparisonResult) -> Self {
        Self {
            cosine_similarity: result.cosine_similarity,
            opencv_match: result.opencv_match,
            distance_score: result.distance_score,
            phash_similarity: result.phash_similarity,
        }
    }
}

/// Compare two uploaded images
///
/// Accepts multipart/form-data with:
/// - **file1** (required): first image
/// - **file2** (required): second image
///
/// Both uploads are stored as temp files for the duration of the request
/// and removed afterwards, whether the comparison succeeds or not.
#[utoipa::path(
    post,
    path = "/compare/",
    tag = "Comparison",
    request_body(
        content_type = "multipart/form-data",
        description = "Two images in fields file1 and file2"
    ),
    responses(
        (status = 200, description = "Comparison scores", body = CompareResponse),
        (status = 400, description = "Missing or invalid upload"),
        (status = 500, description = "Image could not be decoded or a metric failed")
    )
)]
pub async fn compare_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CompareResponse>, ApiError> {
    let mut fields =
        MultipartFields::parse(&mut multipart, &FILE_FIELDS, true, state.max_file_size).await?;
    let first = fields.take_file(FILE_FIELDS[0])?;
    let second = fields.take_file(FILE_FIELDS[1])?;

    tracing::info!(
        file1 = first.file_name.as_deref().unwrap_or("<unnamed>"),
        file2 = second.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes1 = first.data.len(),
        bytes2 = second.data.len(),
        "Comparing uploaded images"
    );

    let comparator = state.comparator.clone();
    let upload_dir = state.upload_dir.clone();

    // Decoding and feature extraction are CPU-bound.
    let result = tokio::task::spawn_blocking(move || -> Result<ComparisonResult, ApiError> {
        let stored1 = TempUpload::write(&upload_dir, &first)?;
        let stored2 = TempUpload::write(&upload_dir, &second)?;
        Ok(comparator.compare(stored1.path(), stored2.path())?)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Comparison task failed: {}", e)))??;

    Ok(Json(result.into()))
}
