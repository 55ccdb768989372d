//! Single-post worker mode.

use postpix_core::types::DbId;
use postpix_db::models::status::PostStatus;
use postpix_pipeline::{JobContext, PipelineError, PostJob};
use serde::Serialize;

/// The one line a unit worker prints on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    pub post_id: DbId,
    pub status: PostStatus,
}

/// Run one post through the pipeline.
pub async fn run_unit(ctx: &JobContext, post_id: DbId) -> Result<UnitResult, PipelineError> {
    let job = PostJob::from_id(ctx, post_id).await?;
    let post = job.run().await?;
    Ok(UnitResult {
        post_id: post.id,
        status: post.status,
    })
}

/// Parse the optional post-id argument: `None` selects dispatcher mode.
pub fn parse_post_id(arg: Option<String>) -> Result<Option<DbId>, uuid::Error> {
    arg.map(|raw| raw.trim().parse()).transpose()
}
