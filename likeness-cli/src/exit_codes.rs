//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell an unreadable input apart from a comparison
//! that failed inside a metric.

use likeness_core::LikenessError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Data format error (a metric failed on the decoded images).
/// Maps to EX_DATAERR from sysexits.h.
pub const COMPARISON_FAILED: i32 = 65;

/// Cannot open or decode an input image.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Configuration error (unsupported feature model in this build).
/// Maps to EX_CONFIG from sysexits.h.
pub const CONFIG_ERROR: i32 = 78;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = match err.downcast_ref::<LikenessError>() {
            Some(LikenessError::ImageLoad { .. }) => INPUT_ERROR,
            Some(LikenessError::Comparison(_)) => COMPARISON_FAILED,
            Some(LikenessError::Configuration(_)) => CONFIG_ERROR,
            _ => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_core_errors() {
        let load = anyhow::Error::new(LikenessError::image_load("a.png", "not found"));
        assert_eq!(ExitCode::from_anyhow(&load).code, INPUT_ERROR);

        let metric = anyhow::Error::new(LikenessError::Comparison("bad shape".into()));
        assert_eq!(ExitCode::from_anyhow(&metric).code, COMPARISON_FAILED);

        let config = anyhow::Error::new(LikenessError::Configuration("vit".into()));
        assert_eq!(ExitCode::from_anyhow(&config).code, CONFIG_ERROR);
    }

    #[test]
    fn test_context_keeps_classification() {
        let err = anyhow::Error::new(LikenessError::image_load("a.png", "not found"))
            .context("Comparison failed");
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, INPUT_ERROR);
        assert!(exit.message.unwrap().contains("a.png"));
    }

    #[test]
    fn test_unknown_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::from_anyhow(&err).code, GENERAL_ERROR);
    }
}
