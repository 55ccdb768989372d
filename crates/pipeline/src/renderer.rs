//! Image generation and upload with a local file cache.
//!
//! Generated bytes are cached at `{cache_dir}/posts/{post_id}/{slug}.png`
//! so a retried post does not pay for generation twice. A cache hit is
//! uploaded as PNG; a fresh image is uploaded under the extension of its
//! media type.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use postpix_ai::image::ImageGenerator;
use postpix_cloud::BlobStore;
use postpix_core::naming::{
    extension_for_media_type, post_image_key, DEFAULT_IMAGE_EXTENSION, DEFAULT_IMAGE_MEDIA_TYPE,
};
use postpix_core::types::DbId;

use crate::error::PipelineError;

pub struct ImageRenderer {
    generator: Arc<dyn ImageGenerator>,
    blobs: Arc<dyn BlobStore>,
    cache_dir: PathBuf,
}

impl ImageRenderer {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        blobs: Arc<dyn BlobStore>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generator,
            blobs,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_path(&self, post_id: DbId, slug: &str) -> PathBuf {
        self.cache_dir
            .join(post_image_key(post_id, slug, DEFAULT_IMAGE_EXTENSION))
    }

    /// Produce the image for `slug` and upload it, returning its public URL.
    pub async fn render(&self, post_id: DbId, slug: &str, prompt: &str) -> Result<String, PipelineError> {
        let cache_path = self.cache_path(post_id, slug);

        let (bytes, media_type) = match tokio::fs::read(&cache_path).await {
            Ok(bytes) => {
                tracing::debug!(%post_id, slug, path = %cache_path.display(), "Image cache hit");
                (bytes, DEFAULT_IMAGE_MEDIA_TYPE.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(%post_id, slug, "Generating image");
                let image = self.generator.generate(prompt).await?;
                write_cache(&cache_path, &image.bytes).await?;
                (image.bytes, image.media_type)
            }
            Err(e) => return Err(e.into()),
        };

        let key = post_image_key(post_id, slug, extension_for_media_type(&media_type));
        let url = self.blobs.put(&key, bytes, &media_type).await?;
        Ok(url)
    }
}

async fn write_cache(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
