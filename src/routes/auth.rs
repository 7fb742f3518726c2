//! Authentication and session endpoints, plus the identity extractors
//! used by every other route module

use axum::{
    Json, Router,
    extract::{FromRequestParts, Multipart, State},
    http::{header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::users;
use crate::envelope::ApiResponse;
use crate::models::UserResponse;
use crate::routes::form;
use crate::services::{cookies, error::ApiError, password, session};
use crate::storage::MediaKind;

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit auth endpoints to slow credential stuffing
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh_session))
        .layer(rate_limit_layer)
}

// ============================================================================
// Identity extractors
// ============================================================================

/// Extractor that validates the access_token cookie and returns the
/// acting user's id. Rejects unauthenticated requests.
pub struct AuthUser(pub i64);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized("missing credentials".into()))?;

        let access_token = jar
            .get(cookies::config::ACCESS_TOKEN_NAME)
            .map(|c| c.value())
            .ok_or_else(|| ApiError::Unauthorized("not logged in".into()))?;

        let user_id = session::validate_access_token(access_token, &state.jwt_secret)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        Ok(AuthUser(user_id))
    }
}

/// Optional-identity extractor for endpoints that work unauthenticated
/// (channel profile, public listings). A missing or invalid token is
/// simply "no requester", never an error.
pub struct MaybeAuthUser(pub Option<i64>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match CookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar
                .get(cookies::config::ACCESS_TOKEN_NAME)
                .map(|c| c.value().to_string())
                .and_then(|token| session::validate_access_token(&token, &state.jwt_secret).ok()),
            Err(_) => None,
        };
        Ok(MaybeAuthUser(user_id))
    }
}

// ============================================================================
// Registration and login
// ============================================================================

/// POST /auth/register - Create an account (multipart: username, email,
/// password, avatar file)
async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = form::read_multipart(multipart, &state.temp_dir).await?;

    let (Some(username), Some(email), Some(password)) = (
        upload.text("username"),
        upload.text("email"),
        upload.text("password"),
    ) else {
        return Err(ApiError::Validation("all fields are required".into()));
    };
    let avatar_path = upload
        .file("avatar")
        .ok_or_else(|| ApiError::Validation("avatar file is required".into()))?;

    if users::get_user_by_username_or_email(&state.db, username, email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("user already exists".into()));
    }

    let uploaded_avatar = state.store.put_file(avatar_path, MediaKind::Image).await?;

    let password_hash =
        password::hash_password(password).map_err(|e| ApiError::Database(e.to_string()))?;

    let user = users::insert_user(
        &state.db,
        username,
        email,
        &password_hash,
        &uploaded_avatar.url,
    )
    .await?;

    Ok(ApiResponse::created(
        "user registered successfully",
        UserResponse::from(user),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
}

/// POST /auth/login - Verify credentials, issue access+refresh tokens
/// as cookies (and in the body for non-browser clients)
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let username = req.username.as_deref().unwrap_or("").trim();
    let email = req.email.as_deref().unwrap_or("").trim();
    if username.is_empty() && email.is_empty() {
        return Err(ApiError::Validation("username or email is required".into()));
    }

    let user = users::get_user_by_username_or_email(&state.db, username, email)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    if !password::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let access_token = session::create_access_token(user.id, &state.jwt_secret)
        .map_err(|e| ApiError::Database(e.to_string()))?;
    let refresh_token = session::create_refresh_token(user.id, &state.jwt_secret)
        .map_err(|e| ApiError::Database(e.to_string()))?;

    users::set_refresh_token(&state.db, user.id, Some(&refresh_token)).await?;

    let data = LoginData {
        access_token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        user: UserResponse::from(user),
    };

    let mut response = ApiResponse::ok("user logged in successfully", data).into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_access_cookie(&access_token)?);
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_refresh_cookie(&refresh_token)?);
    Ok(response)
}

/// POST /auth/logout - Clear the stored refresh token and both cookies
async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, ApiError> {
    users::set_refresh_token(&state.db, user_id, None).await?;

    let mut response = ApiResponse::ok_empty("user logged out successfully").into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_access_cookie());
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_refresh_cookie());
    Ok(response)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    access_token: String,
    refresh_token: String,
}

/// POST /auth/refresh - Rotate both tokens. The presented refresh token
/// must match the one stored on the user row; anything else ends the
/// session.
async fn refresh_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let presented = jar
        .get(cookies::config::REFRESH_TOKEN_NAME)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("unauthorized request".into()))?;

    let user_id = session::validate_refresh_token(&presented, &state.jwt_secret)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("refresh token invalid".into()))?;

    // A rotated-out or logged-out token no longer matches the row.
    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::Unauthorized("refresh token expired".into()));
    }

    let access_token = session::create_access_token(user.id, &state.jwt_secret)
        .map_err(|e| ApiError::Database(e.to_string()))?;
    let refresh_token = session::create_refresh_token(user.id, &state.jwt_secret)
        .map_err(|e| ApiError::Database(e.to_string()))?;

    users::set_refresh_token(&state.db, user.id, Some(&refresh_token)).await?;

    let data = RefreshData {
        access_token: access_token.clone(),
        refresh_token: refresh_token.clone(),
    };

    let mut response = ApiResponse::ok("new access-refresh token generated", data).into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_access_cookie(&access_token)?);
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_refresh_cookie(&refresh_token)?);
    Ok(response)
}
