//! The per-post state machine: `init -> sub-processed -> processed`.
//!
//! [`PostJob::run`] dispatches on the post's persisted status, so a post
//! interrupted after the first phase resumes at the second on its next
//! pickup. Every failure leaves the status where it was.

use std::sync::Arc;

use futures::future::try_join_all;
use postpix_ai::completion::Completion;
use postpix_ai::message::Examples;
use postpix_core::error::CoreError;
use postpix_core::metadata::{ImageWorkItem, PostMetadata};
use postpix_core::types::DbId;
use postpix_db::models::post::Post;
use postpix_db::models::post_image::{CreatePostImage, PostImage};
use postpix_db::models::status::{PostImageType, PostStatus};
use postpix_db::store::PostStore;

use crate::error::PipelineError;
use crate::prompts;
use crate::renderer::ImageRenderer;

/// Collaborators shared by every job a worker runs.
pub struct JobContext {
    pub store: Arc<dyn PostStore>,
    pub completion: Arc<Completion>,
    pub renderer: Arc<ImageRenderer>,
    /// Base of the planned image URLs.
    pub assets_url: String,
}

pub struct PostJob<'a> {
    ctx: &'a JobContext,
    post: Post,
}

impl<'a> PostJob<'a> {
    pub fn new(ctx: &'a JobContext, post: Post) -> Self {
        Self { ctx, post }
    }

    /// Load the post row for `id`.
    pub async fn from_id(ctx: &'a JobContext, id: DbId) -> Result<Self, PipelineError> {
        let post = ctx
            .store
            .find_post(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "post", id })?;
        Ok(Self::new(ctx, post))
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    /// Advance the post as far as it can go and return the final row.
    pub async fn run(mut self) -> Result<Post, PipelineError> {
        let id = self.post.id;
        tracing::info!(post_id = %id, status = %self.post.status, "Running job");

        match self.post.status {
            PostStatus::Init => {
                self.initialize().await?;
                self.reload().await?;
                self.process().await?;
            }
            PostStatus::SubProcessed => self.process().await?,
            PostStatus::Processed => {
                tracing::info!(post_id = %id, "Post already processed");
                return Ok(self.post);
            }
        }

        self.reload().await?;
        tracing::info!(post_id = %id, status = %self.post.status, "Job finished");
        Ok(self.post)
    }

    async fn reload(&mut self) -> Result<(), PipelineError> {
        let id = self.post.id;
        self.post = self
            .ctx
            .store
            .find_post(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "post", id })?;
        Ok(())
    }

    /// Plan the images, embed them in the content, then persist both with
    /// the status change in a single guarded write.
    pub async fn initialize(&self) -> Result<(), PipelineError> {
        let post = &self.post;
        let examples = Examples::new();

        tracing::info!(post_id = %post.id, "Generating image metadata");
        let metadata: PostMetadata = self
            .ctx
            .completion
            .generate_object(
                &prompts::metadata_system_prompt(post.ideal_no_of_section_images, &self.ctx.assets_url),
                &examples,
                &prompts::metadata_user_prompt(post.id, post.title.as_deref(), &post.content),
                &prompts::metadata_schema(),
            )
            .await?;
        let metadata_json = serde_json::to_value(&metadata)?;

        tracing::info!(
            post_id = %post.id,
            section_images = metadata.section_images.len(),
            "Embedding images in content",
        );
        let updated_content = self
            .ctx
            .completion
            .generate_text(
                &prompts::placement_system_prompt(post.ideal_no_of_section_images),
                &examples,
                prompts::placement_user_prompt(&post.content, &metadata_json),
            )
            .await?;

        let moved = self
            .ctx
            .store
            .mark_sub_processed(post.id, &metadata_json, &updated_content)
            .await?;
        if !moved {
            return Err(PipelineError::TransitionRejected {
                id: post.id,
                to: PostStatus::SubProcessed,
            });
        }

        tracing::info!(post_id = %post.id, "Post sub-processed");
        Ok(())
    }

    /// Render every planned image concurrently, then mark the post processed.
    pub async fn process(&self) -> Result<(), PipelineError> {
        let post = &self.post;
        let metadata = post
            .parsed_metadata()?
            .ok_or(PipelineError::MissingMetadata(post.id))?;
        let items = metadata.work_items();

        tracing::info!(post_id = %post.id, images = items.len(), "Processing images");

        let records = try_join_all(items.iter().map(|item| self.ensure_image(item))).await?;
        try_join_all(records.iter().map(|record| self.realize(record))).await?;

        let moved = self.ctx.store.mark_processed(post.id).await?;
        if !moved {
            return Err(PipelineError::TransitionRejected {
                id: post.id,
                to: PostStatus::Processed,
            });
        }

        tracing::info!(post_id = %post.id, "Post processed");
        Ok(())
    }

    /// Look the record up by slug and create it if missing.
    async fn ensure_image(&self, item: &ImageWorkItem) -> Result<PostImage, PipelineError> {
        let post = &self.post;
        if let Some(existing) = self
            .ctx
            .store
            .find_image(post.id, post.user_id, &item.slug)
            .await?
        {
            if let Some(field) = descriptor_mismatch(&existing, item) {
                tracing::warn!(
                    post_id = %post.id,
                    slug = %item.slug,
                    field,
                    "Existing image record differs from its descriptor; keeping the record",
                );
            }
            return Ok(existing);
        }

        let created = self
            .ctx
            .store
            .create_image(&CreatePostImage {
                post_id: post.id,
                user_id: post.user_id,
                image_type: PostImageType::from(item.kind),
                slug: item.slug.clone(),
                prompt: item.prompt.clone(),
                url: item.url.clone(),
            })
            .await?;
        Ok(created)
    }

    /// Generate and upload one image, then flag its record processed.
    async fn realize(&self, image: &PostImage) -> Result<(), PipelineError> {
        let prompt = match image.image_type {
            PostImageType::Banner => prompts::banner_image_prompt(&image.prompt),
            PostImageType::Section => prompts::section_image_prompt(&image.prompt),
        };

        let url = self
            .ctx
            .renderer
            .render(self.post.id, &image.slug, &prompt)
            .await?;
        if url != image.url {
            tracing::warn!(
                post_id = %self.post.id,
                slug = %image.slug,
                planned = %image.url,
                uploaded = %url,
                "Uploaded URL differs from planned URL",
            );
        }

        self.ctx.store.mark_image_processed(image.id).await?;
        Ok(())
    }
}

/// First field in which a stored image record disagrees with the descriptor
/// it is reused for.
fn descriptor_mismatch(record: &PostImage, item: &ImageWorkItem) -> Option<&'static str> {
    if record.image_type != PostImageType::from(item.kind) {
        Some("type")
    } else if record.prompt != item.prompt {
        Some("prompt")
    } else if record.url != item.url {
        Some("url")
    } else {
        None
    }
}
