//! Primary-tier providers: rich multi-part payloads and schema-constrained
//! output.

pub mod gemini;
pub mod mistral;
pub mod openai;

pub(crate) mod chat_completions;

pub use gemini::GeminiProvider;
pub use mistral::MistralProvider;
pub use openai::OpenAiProvider;
