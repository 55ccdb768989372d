use async_trait::async_trait;
use serde_json::json;

use crate::message::ChatRequest;
use crate::provider::{ChatProvider, ProviderError};
use crate::providers::chat_completions::{wire_messages, ChatCompletionsClient};
use crate::providers::mistral::{translate_part, DEFAULT_MISTRAL_MODEL, MISTRAL_BASE_URL};

/// Mistral chat without schema support.
pub struct LegacyMistral {
    api: ChatCompletionsClient,
    model: String,
}

impl LegacyMistral {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, MISTRAL_BASE_URL, api_key, DEFAULT_MISTRAL_MODEL)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api: ChatCompletionsClient::new("mistral-legacy", client, base_url, api_key),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for LegacyMistral {
    fn name(&self) -> &str {
        self.api.provider()
    }

    async fn generate_text(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": wire_messages(request, translate_part)?,
        });
        self.api.complete(&body).await
    }
}
