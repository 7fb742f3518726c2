//! Video domain: CRUD queries and the owner-enriched video views

use sqlx::{Executor, Postgres};

use crate::models::{Video, VideoOwnerRow, VideoWithOwner};

/// Whitelisted sort keys for the video listing. Anything else falls
/// back to creation time so caller input never reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Duration,
    Title,
}

impl SortKey {
    pub fn from_str(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("duration") => SortKey::Duration,
            Some("title") => SortKey::Title,
            _ => SortKey::CreatedAt,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Duration => "duration",
            SortKey::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn from_str(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// List videos with optional owner filter, case-insensitive text search
/// over title/description, whitelisted sort, and pagination. Zero
/// matches is a successful empty page.
pub async fn list_videos<'e, E>(
    executor: E,
    owner_id: Option<i64>,
    query: Option<&str>,
    sort_key: SortKey,
    sort_dir: SortDir,
    limit: i64,
    offset: i64,
) -> Result<Vec<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    // Sort fragments come from the whitelist enums, never from input.
    let sql = format!(
        r#"
        SELECT * FROM videos
        WHERE ($1::bigint IS NULL OR owner_id = $1)
          AND ($2::text IS NULL
               OR title ILIKE '%' || $2 || '%'
               OR description ILIKE '%' || $2 || '%')
        ORDER BY {} {}
        LIMIT $3 OFFSET $4
        "#,
        sort_key.column(),
        sort_dir.keyword()
    );

    sqlx::query_as(&sql)
        .bind(owner_id)
        .bind(query)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

/// Insert a freshly published video; `is_published` takes the schema
/// default (true)
pub async fn insert_video<'e, E>(
    executor: E,
    owner_id: i64,
    video_file: &str,
    thumbnail: &str,
    title: &str,
    description: &str,
    duration: f64,
) -> Result<Video, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO videos (owner_id, video_file, thumbnail, title, description, duration)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(video_file)
    .bind(thumbnail)
    .bind(title)
    .bind(description)
    .bind(duration)
    .fetch_one(executor)
    .await
}

/// Get a raw video record (ownership checks, deletion)
pub async fn get_video<'e, E>(executor: E, video_id: i64) -> Result<Option<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(executor)
        .await
}

/// Owner-enriched single video lookup: one LEFT JOIN, owner collapsed
/// to {username, email, avatar} or null
pub async fn get_video_with_owner<'e, E>(
    executor: E,
    video_id: i64,
) -> Result<Option<VideoWithOwner>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: Option<VideoOwnerRow> = sqlx::query_as(
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
        FROM videos v
        LEFT JOIN users o ON o.id = v.owner_id
        WHERE v.id = $1
        "#,
    )
    .bind(video_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(VideoWithOwner::from))
}

/// Apply a partial update; absent fields keep their stored values
pub async fn update_video<'e, E>(
    executor: E,
    video_id: i64,
    title: Option<&str>,
    description: Option<&str>,
    thumbnail: Option<&str>,
) -> Result<Option<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE videos
        SET title       = COALESCE($2, title),
            description = COALESCE($3, description),
            thumbnail   = COALESCE($4, thumbnail)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(video_id)
    .bind(title)
    .bind(description)
    .bind(thumbnail)
    .fetch_optional(executor)
    .await
}

/// Set the publish flag, returning the updated record
pub async fn set_published<'e, E>(
    executor: E,
    video_id: i64,
    is_published: bool,
) -> Result<Option<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("UPDATE videos SET is_published = $2 WHERE id = $1 RETURNING *")
        .bind(video_id)
        .bind(is_published)
        .fetch_optional(executor)
        .await
}

/// Delete a video row. Returns false when zero rows were affected.
pub async fn delete_video<'e, E>(executor: E, video_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_whitelist() {
        assert_eq!(SortKey::from_str(Some("duration")), SortKey::Duration);
        assert_eq!(SortKey::from_str(Some("title")), SortKey::Title);
        assert_eq!(SortKey::from_str(Some("created_at")), SortKey::CreatedAt);
        // Injection attempts and unknown keys fall back to created_at
        assert_eq!(
            SortKey::from_str(Some("title; DROP TABLE videos")),
            SortKey::CreatedAt
        );
        assert_eq!(SortKey::from_str(None), SortKey::CreatedAt);
    }

    #[test]
    fn test_sort_dir_defaults_ascending() {
        assert_eq!(SortDir::from_str(Some("desc")), SortDir::Desc);
        assert_eq!(SortDir::from_str(Some("asc")), SortDir::Asc);
        assert_eq!(SortDir::from_str(Some("sideways")), SortDir::Asc);
        assert_eq!(SortDir::from_str(None), SortDir::Asc);
    }
}
