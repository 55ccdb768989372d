//! Bounded dispatcher and process-per-post workers.
//!
//! The `postpix-worker` binary runs in one of two modes: with no argument
//! it is the long-lived [`dispatcher::PostDispatcher`]; given a post id it
//! runs that single post through the pipeline ([`unit`]) and exits.

pub mod config;
pub mod dispatcher;
pub mod launcher;
pub mod unit;
