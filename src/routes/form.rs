//! Multipart form collection for upload endpoints
//!
//! Text fields land in a map; file fields are spooled to the request
//! temp directory so the media store can consume them by path. Spooled
//! files that were never consumed are removed when the form drops, so
//! early validation failures do not leak temp files.

use axum::extract::Multipart;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::services::error::ApiError;

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, PathBuf>,
}

impl UploadForm {
    /// Trimmed text field value; empty-after-trim counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Path of a spooled file field
    pub fn file(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }
}

impl Drop for UploadForm {
    fn drop(&mut self) {
        for path in self.files.values() {
            // Already gone if the store consumed it.
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Read every multipart field, spooling files under `temp_dir`
pub async fn read_multipart(
    mut multipart: Multipart,
    temp_dir: &Path,
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let ext = field
                .file_name()
                .and_then(|f| f.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_else(|| "bin".to_string());
            let spool_name = format!(
                "{}_{:08x}.{}",
                chrono::Utc::now().timestamp_millis(),
                rand::rng().random::<u32>(),
                ext
            );
            let path = temp_dir.join(spool_name);

            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
            tokio::fs::create_dir_all(temp_dir)
                .await
                .map_err(|e| ApiError::Storage(format!("temp dir unavailable: {}", e)))?;
            tokio::fs::write(&path, &body)
                .await
                .map_err(|e| ApiError::Storage(format!("failed to spool upload: {}", e)))?;

            form.files.insert(name, path);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("malformed field: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_trims_and_filters_empty() {
        let mut form = UploadForm::default();
        form.fields.insert("title".into(), "  hello  ".into());
        form.fields.insert("blank".into(), "   ".into());
        assert_eq!(form.text("title"), Some("hello"));
        assert_eq!(form.text("blank"), None);
        assert_eq!(form.text("missing"), None);
    }

    #[test]
    fn test_drop_removes_unconsumed_spool_files() {
        let dir = tempfile::tempdir().unwrap();
        let spooled = dir.path().join("leftover.mp4");
        std::fs::write(&spooled, b"data").unwrap();
        {
            let mut form = UploadForm::default();
            form.files.insert("video".into(), spooled.clone());
        }
        assert!(!spooled.exists());
    }
}
