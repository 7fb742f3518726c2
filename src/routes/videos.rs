//! Video endpoints (/videos/*)

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::videos::{self, SortDir, SortKey};
use crate::domain::users;
use crate::envelope::ApiResponse;
use crate::models::{Video, VideoResponse};
use crate::routes::form;
use crate::services::error::{ApiError, ensure_owner, parse_id};
use crate::storage::MediaKind;
use super::auth::AuthUser;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", get(list_videos).post(publish_video))
        .route(
            "/videos/{videoId}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/videos/{videoId}/publish", patch(toggle_publish_status))
        .route("/videos/{videoId}/watch", post(record_watch))
}

/// Offset for a 1-based page. Saturates instead of overflowing, so an
/// absurd page number yields an empty page rather than a panic or a
/// negative OFFSET.
fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVideosQuery {
    page: Option<i64>,
    limit: Option<i64>,
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

/// GET /videos - List videos with search, sort and pagination. Zero
/// matches is a successful empty page, never an error.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListVideosQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = query
        .user_id
        .as_deref()
        .map(|raw| parse_id(raw, "userId"))
        .transpose()?;

    let text_query = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = page_offset(query.page.unwrap_or(1), limit);

    let sort_key = SortKey::from_str(query.sort_by.as_deref());
    let sort_dir = SortDir::from_str(query.sort_type.as_deref());

    let result = videos::list_videos(
        &state.db, owner_id, text_query, sort_key, sort_dir, limit, offset,
    )
    .await?;

    let message = if result.is_empty() {
        "no videos found for this search"
    } else {
        "fetched all videos successfully"
    };
    let data: Vec<VideoResponse> = result.into_iter().map(VideoResponse::from).collect();

    Ok(ApiResponse::ok(message, data))
}

/// POST /videos - Publish a video (multipart: title, description,
/// video file, thumbnail file). Both uploads are fatal on failure;
/// duration comes from the store's probe of the video upload.
async fn publish_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = form::read_multipart(multipart, &state.temp_dir).await?;

    let (Some(title), Some(description)) = (upload.text("title"), upload.text("description"))
    else {
        return Err(ApiError::Validation("all fields are required".into()));
    };
    let video_path = upload
        .file("video")
        .ok_or_else(|| ApiError::Validation("video file is required".into()))?;
    let thumbnail_path = upload
        .file("thumbnail")
        .ok_or_else(|| ApiError::Validation("thumbnail file is required".into()))?;

    let uploaded_video = state.store.put_file(video_path, MediaKind::Video).await?;
    let uploaded_thumbnail = state
        .store
        .put_file(thumbnail_path, MediaKind::Image)
        .await?;

    let video = videos::insert_video(
        &state.db,
        user_id,
        &uploaded_video.url,
        &uploaded_thumbnail.url,
        title,
        description,
        uploaded_video.duration_secs.unwrap_or(0.0),
    )
    .await?;

    Ok(ApiResponse::created(
        "new video published successfully",
        VideoResponse::from(video),
    ))
}

/// GET /videos/:videoId - Owner-enriched single video lookup
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    let video = videos::get_video_with_owner(&state.db, video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("video doesn't exist".into()))?;

    Ok(ApiResponse::ok("video fetched successfully", video))
}

/// Fetch a video and verify the acting user owns it. "Absent" and "not
/// yours" surface as distinct errors.
async fn fetch_owned_video(
    state: &AppState,
    video_id: i64,
    user_id: i64,
    action: &str,
) -> Result<Video, ApiError> {
    let video = videos::get_video(&state.db, video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("video doesn't exist".into()))?;

    ensure_owner(
        video.owner_id,
        user_id,
        format!("user is not authorized to {} this video", action),
    )?;
    Ok(video)
}

/// PATCH /videos/:videoId - Update title/description/thumbnail
/// (multipart; at least one field required). A replacement thumbnail
/// deletes the old asset before the new upload.
async fn update_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let stored = fetch_owned_video(&state, video_id, user_id, "update").await?;

    let upload = form::read_multipart(multipart, &state.temp_dir).await?;
    let title = upload.text("title");
    let description = upload.text("description");
    let thumbnail_path = upload.file("thumbnail");

    if title.is_none() && description.is_none() && thumbnail_path.is_none() {
        return Err(ApiError::Validation(
            "at least one field is required for update".into(),
        ));
    }

    let new_thumbnail = match thumbnail_path {
        Some(path) => {
            state
                .store
                .delete_by_url(&stored.thumbnail, MediaKind::Image)
                .await?;
            let uploaded = state.store.put_file(path, MediaKind::Image).await?;
            Some(uploaded.url)
        }
        None => None,
    };

    let video = videos::update_video(
        &state.db,
        video_id,
        title,
        description,
        new_thumbnail.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::Database("error while updating video".into()))?;

    Ok(ApiResponse::ok(
        "video updated successfully",
        VideoResponse::from(video),
    ))
}

/// DELETE /videos/:videoId - Remove both media assets from the store,
/// then the record. A failed asset deletion aborts before the record
/// is touched, so the row never points at half-deleted media.
async fn delete_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let stored = fetch_owned_video(&state, video_id, user_id, "delete").await?;

    state
        .store
        .delete_by_url(&stored.video_file, MediaKind::Video)
        .await?;
    state
        .store
        .delete_by_url(&stored.thumbnail, MediaKind::Image)
        .await?;

    let deleted = videos::delete_video(&state.db, video_id).await?;
    if !deleted {
        return Err(ApiError::Database(
            "video cannot be deleted, please try again".into(),
        ));
    }

    Ok(ApiResponse::ok_empty("video deleted successfully"))
}

/// PATCH /videos/:videoId/publish - Flip the publish flag
async fn toggle_publish_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let stored = fetch_owned_video(&state, video_id, user_id, "change publish status of").await?;

    let video = videos::set_published(&state.db, video_id, !stored.is_published)
        .await?
        .ok_or_else(|| ApiError::Database("error while changing publish status".into()))?;

    Ok(ApiResponse::ok(
        "publish status changed successfully",
        VideoResponse::from(video),
    ))
}

/// POST /videos/:videoId/watch - Append the video to the acting user's
/// watch history (re-watching appends again)
async fn record_watch(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    videos::get_video(&state.db, video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("video doesn't exist".into()))?;

    users::record_watch(&state.db, user_id, video_id).await?;

    Ok(ApiResponse::ok_empty("watch recorded successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_basic_pagination() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(2, 10), 10);
        assert_eq!(page_offset(5, 25), 100);
    }

    #[test]
    fn test_page_offset_never_negative() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(-3, 10), 0);
        assert_eq!(page_offset(i64::MIN, 10), 0);
    }

    #[test]
    fn test_page_offset_saturates_on_huge_pages() {
        // An out-of-range page is just an empty page, never a panic.
        let offset = page_offset(i64::MAX, 100);
        assert!(offset >= 0);
        assert_eq!(offset, i64::MAX);
    }
}
