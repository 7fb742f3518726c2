//! Media store adapter: local filesystem or GCS
//!
//! Accepts a local file path, returns a stable URL plus probed duration
//! for videos, and supports deletion by URL. Local mode is selected by
//! LOCAL_STORAGE_PATH and serves files through the /media endpoint;
//! otherwise objects go to the configured GCS bucket and get a public
//! storage URL.

use google_cloud_storage::client::Storage;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Asset kind, used for object-path routing and cleanup context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub url: String,
    /// Probed media duration; only present for video uploads
    pub duration_secs: Option<f64>,
}

#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Upload(String),
    Delete(String),
    Probe(String),
    /// The URL does not belong to this store
    ForeignUrl(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "storage io error: {}", msg),
            StorageError::Upload(msg) => write!(f, "upload failed: {}", msg),
            StorageError::Delete(msg) => write!(f, "delete failed: {}", msg),
            StorageError::Probe(msg) => write!(f, "duration probe failed: {}", msg),
            StorageError::ForeignUrl(url) => write!(f, "url not managed by this store: {}", url),
        }
    }
}

#[derive(Clone)]
pub struct MediaStore {
    gcs: Option<Storage>,
    local_root: Option<PathBuf>,
    bucket: String,
}

impl MediaStore {
    pub fn new(gcs: Option<Storage>, local_root: Option<PathBuf>, bucket: String) -> Self {
        Self {
            gcs,
            local_root,
            bucket,
        }
    }

    fn public_base(&self) -> String {
        format!("https://storage.googleapis.com/{}", self.bucket)
    }

    /// Upload a local file and return its stable URL. The local file is
    /// removed afterwards whether or not the upload succeeded, matching
    /// temp-dir upload semantics. Videos get their duration probed with
    /// ffprobe before the bytes leave disk.
    pub async fn put_file(
        &self,
        local_path: &Path,
        kind: MediaKind,
    ) -> Result<UploadedMedia, StorageError> {
        let result = self.put_file_inner(local_path, kind).await;
        // Best-effort temp cleanup; the upload result is what matters.
        let _ = tokio::fs::remove_file(local_path).await;
        result
    }

    async fn put_file_inner(
        &self,
        local_path: &Path,
        kind: MediaKind,
    ) -> Result<UploadedMedia, StorageError> {
        let duration_secs = match kind {
            MediaKind::Video => Some(probe_duration(local_path).await?),
            MediaKind::Image => None,
        };

        let object_path = object_path_for(kind, local_path);

        if let Some(root) = &self.local_root {
            let dest = root.join(&object_path);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::Io(e.to_string()))?;
            }
            tokio::fs::copy(local_path, &dest)
                .await
                .map_err(|e| StorageError::Upload(e.to_string()))?;
            return Ok(UploadedMedia {
                url: format!("/media/{}", object_path),
                duration_secs,
            });
        }

        let Some(gcs) = &self.gcs else {
            return Err(StorageError::Upload(
                "no storage backend configured (set LOCAL_STORAGE_PATH or GOOGLE_APPLICATION_CREDENTIALS)".into(),
            ));
        };

        let body = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let bucket = format!("projects/_/buckets/{}", self.bucket);
        gcs.write_object(&bucket, &object_path, bytes::Bytes::from(body))
            .send_buffered()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(UploadedMedia {
            url: format!("{}/{}", self.public_base(), object_path),
            duration_secs,
        })
    }

    /// Delete an asset by the URL previously returned from `put_file`.
    /// Deleting an already-absent local file succeeds (idempotent).
    pub async fn delete_by_url(&self, url: &str, kind: MediaKind) -> Result<(), StorageError> {
        let object_path = self.object_path_from_url(url)?;

        if let Some(root) = &self.local_root {
            let target = root.join(&object_path);
            return match tokio::fs::remove_file(&target).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Delete(format!(
                    "{} ({}): {}",
                    object_path,
                    kind.prefix(),
                    e
                ))),
            };
        }

        let client = cloud_storage::Client::default();
        client
            .object()
            .delete(&self.bucket, &object_path)
            .await
            .map_err(|e| {
                StorageError::Delete(format!("{} ({}): {}", object_path, kind.prefix(), e))
            })
    }

    /// Recover the object path from a store URL; rejects URLs this
    /// store never issued.
    pub fn object_path_from_url(&self, url: &str) -> Result<String, StorageError> {
        if let Some(path) = url.strip_prefix("/media/") {
            return Ok(path.to_string());
        }
        let base = format!("{}/", self.public_base());
        if let Some(path) = url.strip_prefix(&base) {
            return Ok(path.to_string());
        }
        Err(StorageError::ForeignUrl(url.to_string()))
    }
}

/// Build a collision-resistant object path: kind/day/timestamp_suffix.ext
fn object_path_for(kind: MediaKind, local_path: &Path) -> String {
    let now = chrono::Utc::now();
    let day_bucket = now.format("%Y-%m-%d");
    let timestamp = now.timestamp_millis();
    let suffix: u32 = rand::rng().random();
    let ext = local_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    format!(
        "{}/{}/{}_{:08x}.{}",
        kind.prefix(),
        day_bucket,
        timestamp,
        suffix,
        ext
    )
}

/// Probe media duration in seconds with ffprobe
async fn probe_duration(path: &Path) -> Result<f64, StorageError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(["-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .await
        .map_err(|e| StorageError::Probe(format!("failed to spawn ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StorageError::Probe(format!("ffprobe failed: {}", stderr)));
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|e| StorageError::Probe(format!("unparseable duration: {}", e)))
}

/// Content type for serving local media by extension
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_store(root: &Path) -> MediaStore {
        MediaStore::new(None, Some(root.to_path_buf()), "test_bucket".into())
    }

    #[test]
    fn test_object_path_layout() {
        let path = object_path_for(MediaKind::Video, Path::new("/tmp/upload.mp4"));
        assert!(path.starts_with("video/"));
        assert!(path.ends_with(".mp4"));
        let path = object_path_for(MediaKind::Image, Path::new("/tmp/pic"));
        assert!(path.starts_with("image/"));
        assert!(path.ends_with(".bin"));
    }

    #[test]
    fn test_object_paths_are_unique() {
        let a = object_path_for(MediaKind::Image, Path::new("x.png"));
        let b = object_path_for(MediaKind::Image, Path::new("x.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_url_round_trip_local() {
        let store = local_store(Path::new("/tmp"));
        assert_eq!(
            store
                .object_path_from_url("/media/image/2025-01-01/1_00000001.png")
                .unwrap(),
            "image/2025-01-01/1_00000001.png"
        );
    }

    #[test]
    fn test_url_round_trip_gcs() {
        let store = local_store(Path::new("/tmp"));
        let url = "https://storage.googleapis.com/test_bucket/video/2025-01-01/1_00000001.mp4";
        assert_eq!(
            store.object_path_from_url(url).unwrap(),
            "video/2025-01-01/1_00000001.mp4"
        );
    }

    #[test]
    fn test_foreign_url_is_rejected() {
        let store = local_store(Path::new("/tmp"));
        assert!(matches!(
            store.object_path_from_url("https://example.com/a.png"),
            Err(StorageError::ForeignUrl(_))
        ));
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for("a/b/c.mp4"), "video/mp4");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_delete_missing_local_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        store
            .delete_by_url("/media/image/2025-01-01/gone.png", MediaKind::Image)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_local_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("image/2025-01-01/present.png");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"png").unwrap();

        let store = local_store(dir.path());
        store
            .delete_by_url("/media/image/2025-01-01/present.png", MediaKind::Image)
            .await
            .unwrap();
        assert!(!target.exists());
    }
}
