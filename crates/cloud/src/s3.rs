//! S3-backed [`BlobStore`].

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use postpix_core::naming::public_url;

use crate::{BlobStore, StorageError};

pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_ASSETS_URL: &str = "https://assets.postpix.ai";

/// Bucket and public URL settings.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Public base URL fronting the bucket (CDN or website endpoint).
    pub assets_url: String,
}

impl S3Config {
    /// Load S3 settings from environment variables.
    ///
    /// | Env Var      | Default                      |
    /// |--------------|------------------------------|
    /// | `S3_BUCKET`  | required                     |
    /// | `AWS_REGION` | `us-east-1`                  |
    /// | `ASSETS_URL` | `https://assets.postpix.ai`  |
    ///
    /// Credentials come from the standard AWS provider chain.
    pub fn from_env() -> Result<Self, StorageError> {
        let bucket = std::env::var("S3_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| StorageError::Config("S3_BUCKET is not configured".into()))?;

        Ok(Self {
            bucket,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_AWS_REGION.into()),
            assets_url: std::env::var("ASSETS_URL").unwrap_or_else(|_| DEFAULT_ASSETS_URL.into()),
        })
    }
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    assets_url: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>, assets_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            assets_url: assets_url.into(),
        }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn connect(config: &S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), &config.bucket, &config.assets_url)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        tracing::info!(
            bucket = %self.bucket,
            key,
            content_type,
            size = body.len(),
            "Uploading object",
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, key, error = %DisplayErrorContext(&e), "Upload failed");
                StorageError::Upload {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    reason: DisplayErrorContext(&e).to_string(),
                }
            })?;

        let url = public_url(&self.assets_url, key);
        tracing::info!(%url, "Uploaded object");
        Ok(url)
    }
}
