//! Post illustration pipeline.
//!
//! A [`job::PostJob`] takes one post through metadata planning, content
//! rewriting and image rendering, persisting each status transition
//! through the [`postpix_db::store::PostStore`] seam.

pub mod error;
pub mod job;
pub mod prompts;
pub mod renderer;

pub use error::PipelineError;
pub use job::{JobContext, PostJob};
pub use renderer::ImageRenderer;
