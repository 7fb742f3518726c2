//! Tweet endpoints (/tweets/*)

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::domain::tweets;
use crate::envelope::ApiResponse;
use crate::models::{Tweet, TweetResponse};
use crate::services::error::{ApiError, ensure_owner, parse_id};
use super::auth::AuthUser;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tweets", post(create_tweet))
        .route("/tweets/user/{userId}", get(get_user_tweets))
        .route(
            "/tweets/{tweetId}",
            axum::routing::patch(update_tweet).delete(delete_tweet),
        )
}

#[derive(Deserialize)]
struct TweetContentRequest {
    content: String,
}

/// Validate tweet content: non-empty after trimming, stored trimmed
fn validated_content(raw: &str) -> Result<&str, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("tweet cannot be empty".into()));
    }
    Ok(trimmed)
}

/// POST /tweets - Create a tweet owned by the acting user
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = validated_content(&req.content)?;

    let tweet = tweets::insert_tweet(&state.db, user_id, content).await?;

    Ok(ApiResponse::created(
        "tweet created successfully",
        TweetResponse::from(tweet),
    ))
}

/// GET /tweets/user/:userId - Owner-enriched tweet listing. A user
/// with no tweets gets a successful empty list.
async fn get_user_tweets(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = parse_id(&user_id, "userId")?;

    let result = tweets::list_tweets_with_owner(&state.db, owner_id).await?;

    Ok(ApiResponse::ok("tweets fetched successfully", result))
}

/// Fetch a tweet and verify the acting user owns it
async fn fetch_owned_tweet(
    state: &AppState,
    tweet_id: i64,
    user_id: i64,
) -> Result<Tweet, ApiError> {
    let tweet = tweets::get_tweet(&state.db, tweet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("cannot find tweet".into()))?;

    ensure_owner(
        tweet.owner_id,
        user_id,
        "current user is not the owner of this tweet",
    )?;
    Ok(tweet)
}

/// PATCH /tweets/:tweetId - Replace the tweet content
async fn update_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(tweet_id): Path<String>,
    Json(req): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;
    fetch_owned_tweet(&state, tweet_id, user_id).await?;

    let content = validated_content(&req.content)?;

    let tweet = tweets::update_content(&state.db, tweet_id, content)
        .await?
        .ok_or_else(|| ApiError::Database("tweet cannot be updated".into()))?;

    Ok(ApiResponse::ok(
        "tweet updated successfully",
        TweetResponse::from(tweet),
    ))
}

/// DELETE /tweets/:tweetId - Delete an owned tweet
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;
    fetch_owned_tweet(&state, tweet_id, user_id).await?;

    let deleted = tweets::delete_tweet(&state.db, tweet_id).await?;
    if !deleted {
        return Err(ApiError::Database("tweet cannot be deleted".into()));
    }

    Ok(ApiResponse::ok_empty("tweet deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(validated_content("  hello world  ").unwrap(), "hello world");
    }

    #[test]
    fn test_blank_content_is_rejected() {
        for raw in ["", "   ", "\n\t"] {
            assert!(matches!(
                validated_content(raw),
                Err(ApiError::Validation(_))
            ));
        }
    }
}
