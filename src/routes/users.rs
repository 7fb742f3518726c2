//! Account management and user-centric read models (/users/*)

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::domain::users;
use crate::envelope::ApiResponse;
use crate::models::UserResponse;
use crate::routes::form;
use crate::services::{error::ApiError, password};
use crate::storage::MediaKind;
use super::auth::{AuthUser, MaybeAuthUser};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_account))
        .route("/users/me/password", post(change_password))
        .route("/users/me/avatar", patch(update_avatar))
        .route("/users/me/history", get(get_watch_history))
        .route("/users/channel/{username}", get(get_channel_profile))
}

/// GET /users/me - Current user details
async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    // A valid JWT for a deleted user is still unauthorized.
    let user = users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    Ok(ApiResponse::ok(
        "current user details fetched successfully",
        UserResponse::from(user),
    ))
}

#[derive(Deserialize)]
struct UpdateAccountRequest {
    email: Option<String>,
}

/// PATCH /users/me - Update account details (email)
async fn update_account(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("new email not supplied".into()))?;

    let user = users::update_email(&state.db, user_id, new_email)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(ApiResponse::ok(
        "account details updated successfully",
        UserResponse::from(user),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

/// POST /users/me/password - Change password after verifying the
/// current one
async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.new_password.trim().is_empty() {
        return Err(ApiError::Validation("new password cannot be empty".into()));
    }

    let user = users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    if !password::verify_password(&req.current_password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "current password is incorrect".into(),
        ));
    }

    let new_hash = password::hash_password(&req.new_password)
        .map_err(|e| ApiError::Database(e.to_string()))?;
    users::update_password(&state.db, user_id, &new_hash).await?;

    Ok(ApiResponse::ok_empty("password changed successfully"))
}

/// PATCH /users/me/avatar - Replace the avatar (multipart file
/// "avatar"). The old asset is removed from the store before the new
/// one is uploaded.
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = form::read_multipart(multipart, &state.temp_dir).await?;
    let avatar_path = upload
        .file("avatar")
        .ok_or_else(|| ApiError::Validation("avatar file is required".into()))?;

    let user = users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    state
        .store
        .delete_by_url(&user.avatar, MediaKind::Image)
        .await?;
    let uploaded = state.store.put_file(avatar_path, MediaKind::Image).await?;

    let user = users::update_avatar(&state.db, user_id, &uploaded.url)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(ApiResponse::ok(
        "avatar updated successfully",
        UserResponse::from(user),
    ))
}

/// GET /users/channel/:username - Channel profile with subscriber
/// counts and the requester's subscription flag. Works without a
/// session: the flag is simply false.
async fn get_channel_profile(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(requester): MaybeAuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("username is missing".into()));
    }

    let profile = users::get_channel_profile(&state.db, username, requester)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel does not exist".into()))?;

    Ok(ApiResponse::ok(
        "channel details fetched successfully",
        profile,
    ))
}

/// GET /users/me/history - Watch history, most recent first. An empty
/// history is a successful empty list; a vanished user is NotFound.
async fn get_watch_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let history = users::get_watch_history(&state.db, user_id).await?;

    Ok(ApiResponse::ok(
        "watch history fetched successfully",
        history,
    ))
}
