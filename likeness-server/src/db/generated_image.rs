//! Generated image entity and repository
//!
//! Records images produced by the generation proxy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a generation request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl From<String> for GenerationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Generated image entity from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedImage {
    pub id: String,
    pub prompt_id: String,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub generation_status: GenerationStatus,
    pub created_at: DateTime<Utc>,
}

/// DTO for recording a generated image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGeneratedImage {
    pub prompt_id: String,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub generation_status: GenerationStatus,
}

/// Repository for generated image records
#[derive(Clone)]
pub struct GeneratedImageRepository {
    pool: PgPool,
}

impl GeneratedImageRepository {
    /// Create a new repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a record with a fresh UUID string as its id
    pub async fn create(&self, input: CreateGeneratedImage) -> Result<GeneratedImage, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        let record = sqlx::query_as::<_, GeneratedImage>(
            r#"
            INSERT INTO generated_images (id, prompt_id, image_url, thumbnail_url, generation_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, prompt_id, image_url, thumbnail_url, generation_status, created_at
            "#,
        )
        .bind(&id)
        .bind(&input.prompt_id)
        .bind(&input.image_url)
        .bind(&input.thumbnail_url)
        .bind(input.generation_status.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            id = %record.id,
            status = record.generation_status.as_str(),
            "Stored generated image record"
        );

        Ok(record)
    }

    /// Check database connection health
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
