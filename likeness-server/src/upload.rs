//! Transient storage for uploaded images
//!
//! Comparisons run on files, so each upload is written to a named temp file
//! in the upload directory. The file is deleted when its [`TempUpload`] is
//! dropped, whichever way the request ends.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::ApiError;
use crate::multipart::FileField;
use crate::validation::safe_extension;

/// An uploaded file on disk, removed on drop
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
}

impl TempUpload {
    /// Write an uploaded file into `dir` under a random name
    ///
    /// The client's file extension is kept when it is safe to do so; the
    /// rest of the client-supplied name is discarded.
    pub fn write(dir: &Path, upload: &FileField) -> Result<Self, ApiError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ApiError::internal(format!("Failed to create upload directory: {}", e)))?;

        let suffix = safe_extension(upload.file_name.as_deref())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| ApiError::internal(format!("Failed to create temp file: {}", e)))?;

        file.write_all(&upload.data)
            .and_then(|_| file.flush())
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = upload.data.len(),
            "Stored upload"
        );

        Ok(Self { file })
    }

    /// Location of the stored upload
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn field(name: Option<&str>) -> FileField {
        FileField {
            data: b"payload".to_vec(),
            content_type: None,
            file_name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_upload_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let upload = TempUpload::write(dir.path(), &field(Some("cat.jpg"))).unwrap();
        let path = upload.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));

        drop(upload);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_client_name_does_not_escape_directory() {
        let dir = TempDir::new().unwrap();
        let upload = TempUpload::write(dir.path(), &field(Some("../../escape"))).unwrap();
        assert_eq!(upload.path().parent(), Some(dir.path()));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("uploads");
        let upload = TempUpload::write(&nested, &field(None)).unwrap();
        assert!(upload.path().starts_with(&nested));
    }
}
