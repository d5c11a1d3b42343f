//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use likeness_core::{ComparatorConfig, LikenessError};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: Ipv4Addr,
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 50)
    pub body_limit_mb: usize,
    /// Maximum file size per upload in MB (default: 25)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 60)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Directory for transient comparison uploads (default: temp_uploads)
    pub upload_dir: PathBuf,
    /// Directory where generated images are written (default: images)
    pub images_dir: PathBuf,
    /// Metric strategies for the comparator
    pub comparator: ComparatorConfig,
    /// Mount `/generate_image` (requires HUGGINGFACE_TOKEN and POSTGRES_URL)
    pub enable_generation: bool,
    /// Database connection pool minimum connections (default: 2)
    pub database_min_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            host: Ipv4Addr::LOCALHOST,
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 50,
            max_file_size_mb: 25,
            timeout_secs: 60,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            upload_dir: PathBuf::from("temp_uploads"),
            images_dir: PathBuf::from("images"),
            comparator: ComparatorConfig::default(),
            enable_generation: false,
            database_min_connections: 2,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Fails only on an unknown metric strategy name; every other value
    /// falls back to its default when missing or malformed.
    pub fn from_env() -> Result<Self, LikenessError> {
        let defaults = Self::default();

        let host = match std::env::var("HOST") {
            Ok(h) => h.parse().unwrap_or_else(|_| {
                tracing::warn!(host = %h, "Invalid HOST, falling back to 127.0.0.1");
                Ipv4Addr::LOCALHOST
            }),
            Err(_) => defaults.host,
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let comparator = ComparatorConfig::from_names(
            std::env::var("FEATURE_MODEL").ok().as_deref(),
            std::env::var("DISTANCE_METRIC").ok().as_deref(),
            std::env::var("HASH_ALGORITHM").ok().as_deref(),
        )?;

        Ok(Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            max_file_size_mb: env_parse("MAX_FILE_SIZE_MB").unwrap_or(defaults.max_file_size_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            // Enabled in production unless RATE_LIMIT_ENABLED=false
            rate_limit_enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            images_dir: std::env::var("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            comparator,
            enable_generation: env_flag("ENABLE_GENERATION").unwrap_or(false),
            database_min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.database_min_connections),
        })
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Per-file upload limit in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::{DistanceMetric, FeatureModel, HashAlgorithm};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.upload_dir, PathBuf::from("temp_uploads"));
        assert_eq!(config.images_dir, PathBuf::from("images"));
        assert!(!config.enable_generation);
        assert!(!config.rate_limit_enabled);
    }

    #[test]
    fn test_default_comparator_strategies() {
        let config = Config::default();
        assert_eq!(config.comparator.feature_model, FeatureModel::Hog);
        assert_eq!(config.comparator.distance_metric, DistanceMetric::Ssim);
        assert_eq!(config.comparator.hash_algorithm, HashAlgorithm::Dct64);
    }

    #[test]
    fn test_socket_addr_and_file_size() {
        let config = Config {
            port: 9100,
            max_file_size_mb: 2,
            ..Config::default()
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9100");
        assert_eq!(config.max_file_size(), 2 * 1024 * 1024);
    }
}
