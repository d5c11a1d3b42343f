//! Database module for Likeness Server
//!
//! Contains the connection pool setup, entities, and repositories.

pub mod generated_image;

use std::time::Duration;

use likeness_core::LikenessError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use generated_image::{
    CreateGeneratedImage, GeneratedImage, GeneratedImageRepository, GenerationStatus,
};

/// Base pool size plus overflow headroom.
const MAX_CONNECTIONS: u32 = 30;

/// Connections older than this are closed and replaced.
const MAX_LIFETIME: Duration = Duration::from_secs(300);

/// Database connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    pub url: String,
    /// Minimum idle connections kept in the pool
    pub min_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// Read `POSTGRES_URL`; its absence is a configuration error.
    pub fn from_env(min_connections: u32) -> Result<Self, LikenessError> {
        let url = std::env::var("POSTGRES_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                LikenessError::Configuration("POSTGRES_URL environment variable not set".into())
            })?;

        Ok(Self {
            url,
            min_connections,
        })
    }
}

/// Open the pool and apply pending migrations.
///
/// Connections are pinged before being handed out and recycled every five
/// minutes.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, LikenessError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(config.min_connections.min(MAX_CONNECTIONS))
        .test_before_acquire(true)
        .max_lifetime(MAX_LIFETIME)
        .connect(&config.url)
        .await
        .map_err(|e| LikenessError::Configuration(format!("Database connection failed: {}", e)))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| LikenessError::Configuration(format!("Database migration failed: {}", e)))?;

    tracing::info!(
        max_connections = MAX_CONNECTIONS,
        min_connections = config.min_connections,
        "Database connected and migrations applied"
    );

    Ok(pool)
}
