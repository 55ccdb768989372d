//! Inference client and multi-provider completion layer.
//!
//! Providers are uniform [`provider::ChatProvider`] implementations over a
//! canonical payload ([`message::UserContent`]); each adapter translates
//! content parts into its own wire shape at the boundary. The
//! [`completion::Completion`] layer walks an ordered primary chain and an
//! optional legacy chain, returning the first success.

pub mod completion;
pub mod config;
pub mod describe;
pub mod image;
pub mod legacy;
pub mod message;
pub mod provider;
pub mod providers;

mod http;
