//! Tweet domain: CRUD queries and the owner-enriched tweet listing

use sqlx::{Executor, Postgres};

use crate::models::{Tweet, TweetOwnerRow, TweetWithOwner};

/// Insert a new tweet and return the stored record
pub async fn insert_tweet<'e, E>(
    executor: E,
    owner_id: i64,
    content: &str,
) -> Result<Tweet, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO tweets (owner_id, content)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(content)
    .fetch_one(executor)
    .await
}

/// Get a raw tweet record (ownership checks)
pub async fn get_tweet<'e, E>(executor: E, tweet_id: i64) -> Result<Option<Tweet>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .fetch_optional(executor)
        .await
}

/// Owner-enriched tweet listing for one user: single LEFT JOIN with the
/// owner collapsed to its three projected fields. Empty result is a
/// successful empty listing.
pub async fn list_tweets_with_owner<'e, E>(
    executor: E,
    owner_id: i64,
) -> Result<Vec<TweetWithOwner>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<TweetOwnerRow> = sqlx::query_as(
        r#"
        SELECT t.id,
               t.content,
               t.created_at,
               t.updated_at,
               o.username AS owner_username,
               o.email    AS owner_email,
               o.avatar   AS owner_avatar
        FROM tweets t
        LEFT JOIN users o ON o.id = t.owner_id
        WHERE t.owner_id = $1
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(TweetWithOwner::from).collect())
}

/// Replace the tweet content, returning the updated record
pub async fn update_content<'e, E>(
    executor: E,
    tweet_id: i64,
    content: &str,
) -> Result<Option<Tweet>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE tweets
        SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(tweet_id)
    .bind(content)
    .fetch_optional(executor)
    .await
}

/// Delete a tweet row. Returns false when zero rows were affected.
pub async fn delete_tweet<'e, E>(executor: E, tweet_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
