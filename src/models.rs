//! Shared data models: database records and read-model DTOs
//!
//! Records mirror the Postgres schema. Read-model DTOs are the only
//! types that ever reach serialization, which is how the "no credential
//! or session data in any response" invariant is enforced: `User` is
//! deliberately not `Serialize`, and `OwnerSummary` carries exactly the
//! projected field set {username, email, avatar}.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A user record. Carries `password_hash` and `refresh_token`, so this
/// type must never be serialized; convert to `UserResponse` instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User API response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    // password_hash and refresh_token intentionally omitted
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            avatar: u.avatar,
            created_at: u.created_at,
        }
    }
}

/// Projected owner fields joined into videos/tweets. Exactly this key
/// set and nothing more.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub username: String,
    pub email: String,
    pub avatar: String,
}

/// A video record from the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub owner_id: i64,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Video API response DTO (no owner enrichment)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: i64,
    pub owner_id: i64,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(v: Video) -> Self {
        Self {
            id: v.id,
            owner_id: v.owner_id,
            video_file: v.video_file,
            thumbnail: v.thumbnail,
            title: v.title,
            description: v.description,
            duration: v.duration,
            is_published: v.is_published,
            created_at: v.created_at,
        }
    }
}

/// Owner-enriched video view. `owner` is None when the owning user row
/// no longer exists; callers decide whether that is an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    pub id: i64,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

/// Joined row shape for the video/owner queries
#[derive(Debug, sqlx::FromRow)]
pub struct VideoOwnerRow {
    pub id: i64,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner_username: Option<String>,
    pub owner_email: Option<String>,
    pub owner_avatar: Option<String>,
}

impl From<VideoOwnerRow> for VideoWithOwner {
    fn from(row: VideoOwnerRow) -> Self {
        Self {
            id: row.id,
            video_file: row.video_file,
            thumbnail: row.thumbnail,
            title: row.title,
            description: row.description,
            duration: row.duration,
            is_published: row.is_published,
            created_at: row.created_at,
            owner: collapse_owner(row.owner_username, row.owner_email, row.owner_avatar),
        }
    }
}

/// A tweet record from the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tweet {
    pub id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tweet API response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tweet> for TweetResponse {
    fn from(t: Tweet) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            content: t.content,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Owner-enriched tweet view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetWithOwner {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

/// Joined row shape for the tweet/owner listing
#[derive(Debug, sqlx::FromRow)]
pub struct TweetOwnerRow {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_username: Option<String>,
    pub owner_email: Option<String>,
    pub owner_avatar: Option<String>,
}

impl From<TweetOwnerRow> for TweetWithOwner {
    fn from(row: TweetOwnerRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner: collapse_owner(row.owner_username, row.owner_email, row.owner_avatar),
        }
    }
}

/// Channel profile view: user fields flattened with subscription counts
/// and the requester's membership flag.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub username: String,
    pub avatar: String,
    pub email: String,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed_by_requester: bool,
}

/// Collapse the joined owner columns into a single optional object.
/// The LEFT JOIN yields at most one owner (users.id is the key), so the
/// reduction is "take it if present, else None" rather than assuming a
/// match exists.
fn collapse_owner(
    username: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
) -> Option<OwnerSummary> {
    match (username, email, avatar) {
        (Some(username), Some(email), Some(avatar)) => Some(OwnerSummary {
            username,
            email,
            avatar,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_owner_row() -> TweetOwnerRow {
        TweetOwnerRow {
            id: 7,
            content: "hello".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_username: Some("alice".into()),
            owner_email: Some("alice@example.com".into()),
            owner_avatar: Some("https://cdn.example.com/a.png".into()),
        }
    }

    #[test]
    fn test_owner_projection_is_exactly_three_fields() {
        let tweet = TweetWithOwner::from(sample_owner_row());
        let value = serde_json::to_value(&tweet).unwrap();
        let owner = value["owner"].as_object().unwrap();
        let mut keys: Vec<_> = owner.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["avatar", "email", "username"]);
    }

    #[test]
    fn test_missing_owner_collapses_to_null() {
        let mut row = sample_owner_row();
        row.owner_username = None;
        row.owner_email = None;
        row.owner_avatar = None;
        let tweet = TweetWithOwner::from(row);
        assert!(tweet.owner.is_none());
        let value = serde_json::to_value(&tweet).unwrap();
        assert!(value["owner"].is_null());
    }

    #[test]
    fn test_user_response_never_leaks_credentials() {
        let user = User {
            id: 1,
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            avatar: "https://cdn.example.com/b.png".into(),
            refresh_token: Some("token".into()),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(UserResponse::from(user)).unwrap();
        let serialized = value.to_string();
        assert!(!serialized.contains("argon2"));
        assert!(!serialized.contains("passwordHash"));
        assert!(!serialized.contains("refreshToken"));
    }
}
