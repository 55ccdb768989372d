//! Legacy-tier providers.
//!
//! Plain chat-completions clients with no structured output. They only
//! accept text and image parts; anything else is rejected before the
//! request is sent.

pub mod mistral;
pub mod openai;

pub use mistral::LegacyMistral;
pub use openai::LegacyOpenAi;
