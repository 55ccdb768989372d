//! In-memory [`PostStore`] for tests.
//!
//! Mirrors the guarded transitions of the Postgres repositories so state
//! machine tests exercise the same forward-only rules.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use postpix_core::types::DbId;

use crate::models::post::{CreatePost, Post, DEFAULT_IDEAL_SECTION_IMAGES};
use crate::models::post_image::{CreatePostImage, PostImage};
use crate::models::status::PostStatus;
use crate::store::PostStore;

/// Posts and images held in insertion order.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: Mutex<Vec<Post>>,
    images: Mutex<Vec<PostImage>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a post in `init` status.
    pub fn insert_post(&self, input: CreatePost) -> Post {
        let now = Utc::now();
        let post = Post {
            id: uuid::Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title,
            content: input.content,
            ideal_no_of_section_images: input
                .ideal_no_of_section_images
                .unwrap_or(DEFAULT_IDEAL_SECTION_IMAGES),
            status: PostStatus::Init,
            metadata: None,
            updated_content: None,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().expect("post store poisoned").push(post.clone());
        post
    }

    /// Snapshot of a post.
    pub fn post(&self, id: DbId) -> Option<Post> {
        self.posts
            .lock()
            .expect("post store poisoned")
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Force a status, bypassing the transition guards.
    pub fn set_status(&self, id: DbId, status: PostStatus) {
        let mut posts = self.posts.lock().expect("post store poisoned");
        if let Some(post) = posts.iter_mut().find(|p| p.id == id) {
            post.status = status;
            post.updated_at = Utc::now();
        }
    }

    /// Snapshot of every image record of a post.
    pub fn images(&self, post_id: DbId) -> Vec<PostImage> {
        self.images
            .lock()
            .expect("image store poisoned")
            .iter()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn find_post(&self, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        Ok(self.post(id))
    }

    async fn list_eligible(&self, exclude: &[DbId], limit: usize) -> Result<Vec<Post>, sqlx::Error> {
        Ok(self
            .posts
            .lock()
            .expect("post store poisoned")
            .iter()
            .filter(|p| p.status.is_eligible() && !exclude.contains(&p.id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sub_processed(
        &self,
        id: DbId,
        metadata: &serde_json::Value,
        updated_content: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut posts = self.posts.lock().expect("post store poisoned");
        match posts.iter_mut().find(|p| p.id == id && p.status == PostStatus::Init) {
            Some(post) => {
                post.metadata = Some(metadata.clone());
                post.updated_content = Some(updated_content.to_string());
                post.status = PostStatus::SubProcessed;
                post.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_processed(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut posts = self.posts.lock().expect("post store poisoned");
        match posts.iter_mut().find(|p| {
            p.id == id
                && p.status == PostStatus::SubProcessed
                && p.metadata.is_some()
                && p.updated_content.is_some()
        }) {
            Some(post) => {
                post.status = PostStatus::Processed;
                post.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_image(
        &self,
        post_id: DbId,
        user_id: DbId,
        slug: &str,
    ) -> Result<Option<PostImage>, sqlx::Error> {
        Ok(self
            .images
            .lock()
            .expect("image store poisoned")
            .iter()
            .find(|i| i.post_id == post_id && i.user_id == user_id && i.slug == slug)
            .cloned())
    }

    async fn create_image(&self, input: &CreatePostImage) -> Result<PostImage, sqlx::Error> {
        let mut images = self.images.lock().expect("image store poisoned");
        if let Some(existing) = images
            .iter()
            .find(|i| i.post_id == input.post_id && i.slug == input.slug)
        {
            return Ok(existing.clone());
        }

        let image = PostImage {
            id: uuid::Uuid::new_v4(),
            post_id: input.post_id,
            user_id: input.user_id,
            image_type: input.image_type,
            slug: input.slug.clone(),
            prompt: input.prompt.clone(),
            url: input.url.clone(),
            processed: false,
            created_at: Utc::now(),
        };
        images.push(image.clone());
        Ok(image)
    }

    async fn mark_image_processed(&self, id: DbId) -> Result<(), sqlx::Error> {
        let mut images = self.images.lock().expect("image store poisoned");
        match images.iter_mut().find(|i| i.id == id) {
            Some(image) => {
                image.processed = true;
                Ok(())
            }
            None => Err(sqlx::Error::RowNotFound),
        }
    }

    async fn list_images(&self, post_id: DbId) -> Result<Vec<PostImage>, sqlx::Error> {
        Ok(self.images(post_id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::status::PostImageType;

    fn create_post(store: &MemoryPostStore) -> Post {
        store.insert_post(CreatePost {
            user_id: uuid::Uuid::new_v4(),
            title: Some("Budgeting".into()),
            content: "# Budgeting\n\nSave early.".into(),
            ideal_no_of_section_images: None,
        })
    }

    #[tokio::test]
    async fn eligible_excludes_ids_and_respects_limit() {
        let store = MemoryPostStore::new();
        let a = create_post(&store);
        let b = create_post(&store);
        let c = create_post(&store);

        let rows = store.list_eligible(&[a.id], 10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, [b.id, c.id]);

        let rows = store.list_eligible(&[], 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, a.id);
    }

    #[tokio::test]
    async fn processed_posts_are_not_eligible() {
        let store = MemoryPostStore::new();
        let a = create_post(&store);
        store.set_status(a.id, PostStatus::Processed);

        assert!(store.list_eligible(&[], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transitions_only_move_forward() {
        let store = MemoryPostStore::new();
        let post = create_post(&store);

        // Cannot skip straight to processed.
        assert!(!store.mark_processed(post.id).await.unwrap());

        assert!(store
            .mark_sub_processed(post.id, &json!({"banner": {}}), "updated")
            .await
            .unwrap());
        // Second initialize is rejected.
        assert!(!store
            .mark_sub_processed(post.id, &json!({}), "again")
            .await
            .unwrap());

        assert!(store.mark_processed(post.id).await.unwrap());
        assert_eq!(store.post(post.id).unwrap().status, PostStatus::Processed);
        assert_eq!(store.post(post.id).unwrap().updated_content.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn create_image_is_idempotent_per_slug() {
        let store = MemoryPostStore::new();
        let post = create_post(&store);
        let input = CreatePostImage {
            post_id: post.id,
            user_id: post.user_id,
            image_type: PostImageType::Banner,
            slug: "hero".into(),
            prompt: "a hero".into(),
            url: "https://assets/hero.png".into(),
        };

        let first = store.create_image(&input).await.unwrap();
        let second = store.create_image(&input).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.images(post.id).len(), 1);
    }
}
