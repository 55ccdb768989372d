//! The uniform provider interface.

use async_trait::async_trait;

use crate::message::ChatRequest;

/// JSON schema a structured completion must conform to.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    /// Short identifier some APIs require alongside the schema.
    pub name: String,
    pub schema: serde_json::Value,
}

/// Errors from a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("No response from {provider}")]
    EmptyResponse { provider: String },

    /// A content part this provider cannot express.
    #[error("Unsupported part type: {0}")]
    UnsupportedPart(String),

    #[error("{provider} does not support structured output")]
    SchemaUnsupported { provider: String },

    #[error("Invalid JSON from {provider}: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid image payload from {provider}: {reason}")]
    InvalidImage { provider: String, reason: String },
}

/// A named inference backend.
///
/// Implementations translate the canonical [`ChatRequest`] into their own
/// wire format. Structured output is optional; providers without schema
/// support keep the default [`ChatProvider::generate_json`].
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_text(&self, request: &ChatRequest) -> Result<String, ProviderError>;

    async fn generate_json(
        &self,
        request: &ChatRequest,
        schema: &ObjectSchema,
    ) -> Result<serde_json::Value, ProviderError> {
        let _ = (request, schema);
        Err(ProviderError::SchemaUnsupported {
            provider: self.name().to_string(),
        })
    }
}
