//! Repository for the `post` table.
//!
//! Status transitions are guarded by the expected current status so a post
//! can only move forward through `init -> sub-processed -> processed`.

use postpix_core::types::DbId;
use sqlx::PgPool;

use crate::models::post::{CreatePost, Post, DEFAULT_IDEAL_SECTION_IMAGES};
use crate::models::status::{PostStatus, ELIGIBLE_POST_STATUSES};

/// Column list for `post` queries.
const COLUMNS: &str = "\
    id, user_id, title, content, ideal_no_of_section_images, status, \
    metadata, updated_content, created_at, updated_at";

/// Provides CRUD operations and guarded status transitions for posts.
pub struct PostRepo;

impl PostRepo {
    /// Insert a new post in `init` status.
    pub async fn create(pool: &PgPool, input: &CreatePost) -> Result<Post, sqlx::Error> {
        let query = format!(
            "INSERT INTO post (user_id, title, content, ideal_no_of_section_images, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(
                input
                    .ideal_no_of_section_images
                    .unwrap_or(DEFAULT_IDEAL_SECTION_IMAGES),
            )
            .bind(PostStatus::Init)
            .fetch_one(pool)
            .await
    }

    /// Find a post by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM post WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List posts the dispatcher may pick up, oldest first.
    ///
    /// Rows whose id is in `exclude` (already in flight) are skipped and at
    /// most `limit` rows are returned.
    pub async fn list_eligible(
        pool: &PgPool,
        exclude: &[DbId],
        limit: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM post \
             WHERE status IN ($1, $2) \
               AND NOT (id = ANY($3)) \
             ORDER BY created_at ASC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(ELIGIBLE_POST_STATUSES[0])
            .bind(ELIGIBLE_POST_STATUSES[1])
            .bind(exclude)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Persist metadata and rewritten content and advance `init -> sub-processed`
    /// in a single update.
    ///
    /// Returns `false` if the post was not in `init`.
    pub async fn mark_sub_processed(
        pool: &PgPool,
        id: DbId,
        metadata: &serde_json::Value,
        updated_content: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE post \
             SET metadata = $2, updated_content = $3, status = $4, updated_at = NOW() \
             WHERE id = $1 AND status = $5",
        )
        .bind(id)
        .bind(metadata)
        .bind(updated_content)
        .bind(PostStatus::SubProcessed)
        .bind(PostStatus::Init)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Advance `sub-processed -> processed`.
    ///
    /// Returns `false` if the post was not in `sub-processed` or is missing
    /// its metadata or rewritten content.
    pub async fn mark_processed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE post \
             SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 \
               AND metadata IS NOT NULL AND updated_content IS NOT NULL",
        )
        .bind(id)
        .bind(PostStatus::Processed)
        .bind(PostStatus::SubProcessed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
