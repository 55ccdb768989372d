//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod post_image_repo;
pub mod post_repo;

pub use post_image_repo::PostImageRepo;
pub use post_repo::PostRepo;
