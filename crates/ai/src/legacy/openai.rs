use async_trait::async_trait;
use serde_json::{json, Value};

use crate::message::{ChatRequest, ContentPart};
use crate::provider::{ChatProvider, ProviderError};
use crate::providers::chat_completions::{wire_messages, ChatCompletionsClient};
use crate::providers::openai::{DEFAULT_OPENAI_MODEL, OPENAI_BASE_URL};

/// OpenAI chat completions without schema support.
pub struct LegacyOpenAi {
    api: ChatCompletionsClient,
    model: String,
}

impl LegacyOpenAi {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, OPENAI_BASE_URL, api_key, DEFAULT_OPENAI_MODEL)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api: ChatCompletionsClient::new("openai-legacy", client, base_url, api_key),
            model: model.into(),
        }
    }
}

fn translate_part(part: &ContentPart) -> Result<Value, ProviderError> {
    match part {
        ContentPart::Text { text } => Ok(json!({ "type": "text", "text": text })),
        ContentPart::Image { image } => Ok(json!({
            "type": "image_url",
            "image_url": { "url": image },
        })),
        other => Err(ProviderError::UnsupportedPart(other.kind().to_string())),
    }
}

#[async_trait]
impl ChatProvider for LegacyOpenAi {
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
