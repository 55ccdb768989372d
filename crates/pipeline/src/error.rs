use postpix_ai::completion::CompletionError;
use postpix_ai::provider::ProviderError;
use postpix_cloud::StorageError;
use postpix_core::error::CoreError;
use postpix_core::types::DbId;
use postpix_db::models::status::PostStatus;

/// Failure of one job phase. The post keeps its last persisted status.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Post {0} has no metadata")]
    MissingMetadata(DbId),

    /// The guarded status update matched no row.
    #[error("Post {id} could not move to '{to}'")]
    TransitionRejected { id: DbId, to: PostStatus },

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Image generation failed: {0}")]
    ImageGeneration(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Image cache error: {0}")]
    Cache(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
