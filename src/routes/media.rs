//! Local media serving (/media/*), used when the store runs in
//! local-filesystem mode. GCS mode hands out storage URLs directly and
//! never hits this route.

use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use crate::AppState;
use crate::services::error::ApiError;
use crate::storage::content_type_for;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/media/{*path}", get(serve_media))
}

/// GET /media/*path - Stream a stored media file from local storage
async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(root) = &state.local_media_root else {
        return Err(ApiError::NotFound("media not found".into()));
    };

    // Reject traversal; stored object paths never contain dot segments.
    if path.split('/').any(|seg| seg == ".." || seg.is_empty()) {
        return Err(ApiError::Validation("invalid media path".into()));
    }

    let full_path = root.join(&path);
    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|_| ApiError::NotFound("media not found".into()))?;

    // Object paths embed a timestamp, so files are immutable and can be
    // cached aggressively.
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
