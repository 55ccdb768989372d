//! Repository for the `post_image` table.

use postpix_core::types::DbId;
use sqlx::PgPool;

use crate::models::post_image::{CreatePostImage, PostImage};

/// Column list for `post_image` queries.
const COLUMNS: &str = "id, post_id, user_id, type, slug, prompt, url, processed, created_at";

/// Provides CRUD operations for post images.
pub struct PostImageRepo;

impl PostImageRepo {
    /// Find the image record for `(post_id, slug)` owned by `user_id`.
    pub async fn find_by_slug(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
        slug: &str,
    ) -> Result<Option<PostImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM post_image \
             WHERE post_id = $1 AND user_id = $2 AND slug = $3"
        );
        sqlx::query_as::<_, PostImage>(&query)
            .bind(post_id)
            .bind(user_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Insert an image record.
    ///
    /// A concurrent insert for the same `(post_id, slug)` resolves to the
    /// existing row instead of failing.
    pub async fn create(pool: &PgPool, input: &CreatePostImage) -> Result<PostImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO post_image (post_id, user_id, type, slug, prompt, url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (post_id, slug) DO UPDATE SET slug = EXCLUDED.slug \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostImage>(&query)
            .bind(input.post_id)
            .bind(input.user_id)
            .bind(input.image_type)
            .bind(&input.slug)
            .bind(&input.prompt)
            .bind(&input.url)
            .fetch_one(pool)
            .await
    }

    /// Flag an image as generated and uploaded.
    pub async fn mark_processed(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE post_image SET processed = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List all image records of a post, oldest first.
    pub async fn list_by_post(pool: &PgPool, post_id: DbId) -> Result<Vec<PostImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM post_image WHERE post_id = $1 ORDER BY created_at ASC, slug ASC"
        );
        sqlx::query_as::<_, PostImage>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }
}
