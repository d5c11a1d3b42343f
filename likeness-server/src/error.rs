//! API error handling module
//!
//! Provides a unified error type for all API endpoints. Every error response
//! carries `{"detail": <message>, "code": <CODE>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use likeness_core::LikenessError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Likeness core error - comparison, loading, or generation failure
    #[error(transparent)]
    Likeness(#[from] LikenessError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            // Comparison and load failures are reported as server errors,
            // matching what existing clients of /compare/ expect.
            Self::Likeness(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Likeness(ref e) => match e {
                LikenessError::ImageLoad { .. } => "IMAGE_LOAD_ERROR",
                LikenessError::Comparison(_) => "COMPARISON_ERROR",
                LikenessError::Configuration(_) => "CONFIGURATION_ERROR",
                LikenessError::Generation(_) | LikenessError::HttpError(_) => "GENERATION_ERROR",
            },
        }
    }

    /// Get the message returned to the client
    ///
    /// Comparison failures keep the underlying cause; generation failures
    /// are reduced to a fixed message so upstream details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Likeness(LikenessError::Generation(_) | LikenessError::HttpError(_)) => {
                "Failed to generate image.".to_string()
            }
            Self::Likeness(ref e) => e.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        let body = serde_json::json!({
            "detail": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::service_unavailable("x").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let load: ApiError = LikenessError::image_load("a.png", "missing").into();
        assert_eq!(load.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(load.error_code(), "IMAGE_LOAD_ERROR");
    }

    #[test]
    fn test_comparison_message_keeps_cause() {
        let err: ApiError = LikenessError::Comparison("shape mismatch".into()).into();
        assert!(err.client_message().contains("shape mismatch"));
        assert_eq!(err.error_code(), "COMPARISON_ERROR");
    }

    #[test]
    fn test_generation_message_is_fixed() {
        let err: ApiError = LikenessError::Generation("upstream returned 503".into()).into();
        assert_eq!(err.client_message(), "Failed to generate image.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
