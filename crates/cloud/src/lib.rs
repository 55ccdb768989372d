//! Blob storage for generated assets.
//!
//! [`BlobStore`] is the seam the pipeline uploads through; [`s3::S3BlobStore`]
//! is the production implementation.

use async_trait::async_trait;

pub mod s3;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use s3::{S3BlobStore, S3Config};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to upload s3://{bucket}/{key}: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Storage configuration error: {0}")]
    Config(String),
}

/// Write-only object store returning the public URL of each object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}
