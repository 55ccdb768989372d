//! OpenAI chat completions as a primary provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::chat_completions::{json_schema_format, wire_messages, ChatCompletionsClient};
use crate::message::{ChatRequest, ContentPart};
use crate::provider::{ChatProvider, ObjectSchema, ProviderError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Primary OpenAI adapter: text, image and inline-file parts, JSON schema
/// structured output.
pub struct OpenAiProvider {
    api: ChatCompletionsClient,
    model: String,
}

impl OpenAiProvider {
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
            api: ChatCompletionsClient::new("openai", client, base_url, api_key),
            model: model.into(),
        }
    }

    fn body(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        Ok(json!({
            "model": self.model,
            "messages": wire_messages(request, translate_part)?,
        }))
    }
}

/// OpenAI content-part tagging.
pub(crate) fn translate_part(part: &ContentPart) -> Result<Value, ProviderError> {
    Ok(match part {
        ContentPart::Text { text } => json!({ "type": "text", "text": text }),
        ContentPart::Image { image } => json!({
            "type": "image_url",
            "image_url": { "url": image },
        }),
        ContentPart::File { data, .. } => json!({
            "type": "file",
            "file": { "file_data": data },
        }),
    })
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.api.provider()
    }

    async fn generate_text(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = self.body(request)?;
        self.api.complete(&body).await
    }

    async fn generate_json(
        &self,
        request: &ChatRequest,
        schema: &ObjectSchema,
    ) -> Result<Value, ProviderError> {
        let mut body = self.body(request)?;
        body["response_format"] = json_schema_format(&schema.name, &schema.schema);
        self.api.complete_json(&body).await
    }
}
