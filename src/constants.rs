//! Application constants

/// Default GCS bucket name for media storage (override with MEDIA_BUCKET)
pub const DEFAULT_BUCKET_NAME: &str = "tubehub_media_data";

/// Maximum upload size for video publishing (200 MB)
pub const MAX_UPLOAD_SIZE: usize = 200 * 1024 * 1024;

/// Default page size for paginated list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for paginated list endpoints
pub const MAX_PAGE_SIZE: i64 = 100;
