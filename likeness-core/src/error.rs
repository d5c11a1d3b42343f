use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LikenessError {
    /// Input path missing, unreadable, or not a decodable image.
    #[error("Failed to load image {}: {reason}", path.display())]
    ImageLoad { path: PathBuf, reason: String },

    /// A metric adapter failed; the whole comparison is abandoned.
    #[error("Comparison error: {0}")]
    Comparison(String),

    /// Required configuration is absent or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Image generation error: {0}")]
    Generation(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LikenessError {
    /// Build an [`LikenessError::ImageLoad`] for the given path.
    pub fn image_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ImageLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from reading or decoding an input image.
    pub fn is_image_load(&self) -> bool {
        matches!(self, Self::ImageLoad { .. })
    }
}

pub type Result<T> = std::result::Result<T, LikenessError>;
