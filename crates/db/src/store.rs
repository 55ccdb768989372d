//! The work-table seam.
//!
//! [`PostStore`] is everything the pipeline and the dispatcher need from
//! the database: row-scoped reads and guarded updates on `post`, plus the
//! image records hanging off each post. [`PgPostStore`] delegates to the
//! repositories; tests use the in-memory store from [`crate::memory`].

use async_trait::async_trait;
use postpix_core::types::DbId;

use crate::models::post::Post;
use crate::models::post_image::{CreatePostImage, PostImage};
use crate::repositories::{PostImageRepo, PostRepo};
use crate::DbPool;

/// Row-level operations on the `post` and `post_image` tables.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_post(&self, id: DbId) -> Result<Option<Post>, sqlx::Error>;

    /// Posts in `init` or `sub-processed`, excluding `exclude`, at most `limit`.
    async fn list_eligible(&self, exclude: &[DbId], limit: usize) -> Result<Vec<Post>, sqlx::Error>;

    /// Guarded `init -> sub-processed` with metadata and content in one write.
    async fn mark_sub_processed(
        &self,
        id: DbId,
        metadata: &serde_json::Value,
        updated_content: &str,
    ) -> Result<bool, sqlx::Error>;

    /// Guarded `sub-processed -> processed`.
    async fn mark_processed(&self, id: DbId) -> Result<bool, sqlx::Error>;

    async fn find_image(
        &self,
        post_id: DbId,
        user_id: DbId,
        slug: &str,
    ) -> Result<Option<PostImage>, sqlx::Error>;

    async fn create_image(&self, input: &CreatePostImage) -> Result<PostImage, sqlx::Error>;

    async fn mark_image_processed(&self, id: DbId) -> Result<(), sqlx::Error>;

    async fn list_images(&self, post_id: DbId) -> Result<Vec<PostImage>, sqlx::Error>;
}

/// [`PostStore`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgPostStore {
    pool: DbPool,
}

impl PgPostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_post(&self, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        PostRepo::find_by_id(&self.pool, id).await
    }

    async fn list_eligible(&self, exclude: &[DbId], limit: usize) -> Result<Vec<Post>, sqlx::Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        PostRepo::list_eligible(&self.pool, exclude, limit).await
    }

    async fn mark_sub_processed(
        &self,
        id: DbId,
        metadata: &serde_json::Value,
        updated_content: &str,
    ) -> Result<bool, sqlx::Error> {
        PostRepo::mark_sub_processed(&self.pool, id, metadata, updated_content).await
    }

    async fn mark_processed(&self, id: DbId) -> Result<bool, sqlx::Error> {
        PostRepo::mark_processed(&self.pool, id).await
    }

    async fn find_image(
        &self,
        post_id: DbId,
        user_id: DbId,
        slug: &str,
    ) -> Result<Option<PostImage>, sqlx::Error> {
        PostImageRepo::find_by_slug(&self.pool, post_id, user_id, slug).await
    }

    async fn create_image(&self, input: &CreatePostImage) -> Result<PostImage, sqlx::Error> {
        PostImageRepo::create(&self.pool, input).await
    }

    async fn mark_image_processed(&self, id: DbId) -> Result<(), sqlx::Error> {
        PostImageRepo::mark_processed(&self.pool, id).await
    }

    async fn list_images(&self, post_id: DbId) -> Result<Vec<PostImage>, sqlx::Error> {
        PostImageRepo::list_by_post(&self.pool, post_id).await
    }
}
