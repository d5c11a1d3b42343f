//! Multipart form parsing helpers
//!
//! Collects named file fields from a multipart/form-data request, validating
//! each file as it is read.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File fields indexed by field name
    files: HashMap<String, FileField>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// A field is read as a file when its name is listed in `file_fields` or
    /// when the client sent a filename for it. Every file is checked against
    /// `max_file_size`, and its Content-Type when `check_content_type` is set.
    pub async fn parse(
        multipart: &mut Multipart,
        file_fields: &[&str],
        check_content_type: bool,
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if file_fields.contains(&name.as_str()) || field.file_name().is_some() {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());

                if check_content_type {
                    validate_content_type(content_type.as_deref())?;
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("Failed to read file '{}': {}", name, e))
                    })?
                    .to_vec();

                validate_file_size(data.len(), max_file_size)?;

                fields.files.insert(
                    name,
                    FileField {
                        data,
                        content_type,
                        file_name,
                    },
                );
            } else {
                tracing::debug!(field = %name, "Ignoring non-file multipart field");
            }
        }

        Ok(fields)
    }

    /// Remove and return a required file field
    pub fn take_file(&mut self, name: &str) -> Result<FileField, ApiError> {
        self.files.remove(name).ok_or_else(|| {
            ApiError::bad_request(format!(
                "No file provided. Use '{}' field in multipart form.",
                name
            ))
        })
    }
}
