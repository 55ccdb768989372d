//! Post entity: the unit of work advanced by the pipeline.

use postpix_core::error::CoreError;
use postpix_core::metadata::PostMetadata;
use postpix_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::PostStatus;

/// Section-image count used when a post does not specify one.
pub const DEFAULT_IDEAL_SECTION_IMAGES: i32 = 3;

/// A row from the `post` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: DbId,
    pub user_id: DbId,
    pub title: Option<String>,
    pub content: String,
    pub ideal_no_of_section_images: i32,
    pub status: PostStatus,
    pub metadata: Option<serde_json::Value>,
    pub updated_content: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Post {
    /// Parse the stored metadata, if any.
    pub fn parsed_metadata(&self) -> Result<Option<PostMetadata>, CoreError> {
        self.metadata
            .as_ref()
            .map(PostMetadata::from_json)
            .transpose()
    }
}

/// DTO for inserting a new post in `init` status.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub user_id: DbId,
    pub title: Option<String>,
    pub content: String,
    pub ideal_no_of_section_images: Option<i32>,
}
