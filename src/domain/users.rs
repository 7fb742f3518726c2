//! User domain: account queries and the user-centric read models
//! (channel profile, watch history)

use sqlx::{Executor, Postgres};

use crate::models::{ChannelProfile, User, VideoOwnerRow, VideoWithOwner};

/// Get a user by ID
pub async fn get_user_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Find a user matching either username or email (login / registration
/// uniqueness check)
pub async fn get_user_by_username_or_email<'e, E>(
    executor: E,
    username: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $2")
        .bind(username)
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// Insert a new user and return the stored record
pub async fn insert_user<'e, E>(
    executor: E,
    username: &str,
    email: &str,
    password_hash: &str,
    avatar: &str,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash, avatar)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(avatar)
    .fetch_one(executor)
    .await
}

/// Store or clear the refresh token on the user row
pub async fn set_refresh_token<'e, E>(
    executor: E,
    user_id: i64,
    token: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
        .bind(token)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Update the user's email, returning the updated record
pub async fn update_email<'e, E>(
    executor: E,
    user_id: i64,
    email: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("UPDATE users SET email = $1 WHERE id = $2 RETURNING *")
        .bind(email)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Update the user's avatar URL, returning the updated record
pub async fn update_avatar<'e, E>(
    executor: E,
    user_id: i64,
    avatar: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("UPDATE users SET avatar = $1 WHERE id = $2 RETURNING *")
        .bind(avatar)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Replace the user's password hash
pub async fn update_password<'e, E>(
    executor: E,
    user_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Channel profile composition: one query joining the subscription
/// relation twice (as channel, as subscriber) plus the requester's
/// membership flag. A NULL requester makes the EXISTS clause match
/// nothing, so the flag defaults to false without a code path.
pub async fn get_channel_profile<'e, E>(
    executor: E,
    username: &str,
    requester: Option<i64>,
) -> Result<Option<ChannelProfile>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT u.username,
               u.avatar,
               u.email,
               (SELECT COUNT(*) FROM subscriptions s
                WHERE s.channel_id = u.id) AS subscriber_count,
               (SELECT COUNT(*) FROM subscriptions s
                WHERE s.subscriber_id = u.id) AS subscribed_to_count,
               EXISTS(SELECT 1 FROM subscriptions s
                      WHERE s.channel_id = u.id
                        AND s.subscriber_id = $2) AS is_subscribed_by_requester
        FROM users u
        WHERE u.username = $1
        "#,
    )
    .bind(username)
    .bind(requester)
    .fetch_optional(executor)
    .await
}

/// Watch-history composition: history rows joined to their videos, each
/// video joined to its owner projection. Ordered by history insertion
/// (most recent watch first), not by any joined-table order. Duplicates
/// in the history produce duplicate entries here.
pub async fn get_watch_history<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<VideoWithOwner>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<VideoOwnerRow> = sqlx::query_as(
        r#"
        SELECT v.id,
               v.video_file,
               v.thumbnail,
               v.title,
               v.description,
               v.duration,
               v.is_published,
               v.created_at,
               o.username AS owner_username,
               o.email    AS owner_email,
               o.avatar   AS owner_avatar
        FROM watch_history wh
        JOIN videos v ON v.id = wh.video_id
        LEFT JOIN users o ON o.id = v.owner_id
        WHERE wh.user_id = $1
        ORDER BY wh.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(VideoWithOwner::from).collect())
}

/// Append a video to the user's watch history (re-watches append again)
pub async fn record_watch<'e, E>(
    executor: E,
    user_id: i64,
    video_id: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("INSERT INTO watch_history (user_id, video_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(())
}
