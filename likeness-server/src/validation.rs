//! Upload validation module
//!
//! Provides validation utilities for multipart image uploads.

use crate::error::ApiError;

/// Allowed MIME type prefixes for image uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Default max file size in bytes (25 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Longest file extension carried over to a temp file name
const MAX_EXTENSION_LEN: usize = 5;

/// Validates the Content-Type of an uploaded file
///
/// Accepts `image/*` and `application/octet-stream`; a missing Content-Type
/// is treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file is empty or exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        return Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )));
    }
    Ok(())
}

/// Extract a safe extension from a client-supplied file name
///
/// Only short ASCII-alphanumeric extensions are kept; anything else yields
/// `None`, so client input never shapes a path beyond its suffix.
pub fn safe_extension(file_name: Option<&str>) -> Option<String> {
    let (_, ext) = file_name?.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_type_image() {
        assert!(validate_content_type(Some("image/jpeg")).is_ok());
        assert!(validate_content_type(Some("image/png")).is_ok());
        assert!(validate_content_type(Some("image/webp")).is_ok());
        assert!(validate_content_type(Some("IMAGE/JPEG")).is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_content_type_binary_and_missing() {
        assert!(validate_content_type(Some("application/octet-stream")).is_ok());
        assert!(validate_content_type(None).is_ok());
    }

    #[test]
    fn test_validate_content_type_rejected() {
        assert!(validate_content_type(Some("text/html")).is_err());
        assert!(validate_content_type(Some("video/mp4")).is_err());
        assert!(validate_content_type(Some("application/json")).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let max = 10 * 1024 * 1024; // 10 MB
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok()); // exactly max
        assert!(validate_file_size(max + 1, max).is_err());
        assert!(validate_file_size(0, max).is_err());
    }

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension(Some("photo.PNG")), Some("png".to_string()));
        assert_eq!(safe_extension(Some("archive.tar.gz")), Some("gz".to_string()));
        assert_eq!(safe_extension(Some("../../etc/passwd")), None);
        assert_eq!(safe_extension(Some("evil.p/ng")), None);
        assert_eq!(safe_extension(Some("noext")), None);
        assert_eq!(safe_extension(Some("long.extension")), None);
        assert_eq!(safe_extension(None), None);
    }
}
