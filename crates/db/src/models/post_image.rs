//! Post image entity: one generated banner or section image.

use postpix_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::PostImageType;

/// A row from the `post_image` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostImage {
    pub id: DbId,
    pub post_id: DbId,
    pub user_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub image_type: PostImageType,
    pub slug: String,
    pub prompt: String,
    pub url: String,
    pub processed: bool,
    pub created_at: Timestamp,
}

/// DTO for creating an image record from a metadata descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostImage {
    pub post_id: DbId,
    pub user_id: DbId,
    #[serde(rename = "type")]
    pub image_type: PostImageType,
    pub slug: String,
    pub prompt: String,
    pub url: String,
}
