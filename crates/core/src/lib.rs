//! Shared domain types for the postpix content pipeline.
//!
//! Holds the persisted post metadata contract, asset naming rules, the
//! bounded retry primitive, and the error type shared by the other crates.

pub mod error;
pub mod metadata;
pub mod naming;
pub mod retry;
pub mod types;
