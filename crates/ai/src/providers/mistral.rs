//! Mistral chat completions as a primary provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::chat_completions::{json_schema_format, wire_messages, ChatCompletionsClient};
use crate::message::{ChatRequest, ContentPart};
use crate::provider::{ChatProvider, ObjectSchema, ProviderError};

pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-large-latest";

/// Primary Mistral adapter with JSON schema structured output.
pub struct MistralProvider {
    api: ChatCompletionsClient,
    model: String,
}

impl MistralProvider {
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
            api: ChatCompletionsClient::new("mistral", client, base_url, api_key),
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

/// Mistral content-part tagging: image URLs are a flat string.
pub(crate) fn translate_part(part: &ContentPart) -> Result<Value, ProviderError> {
    match part {
        ContentPart::Text { text } => Ok(json!({ "type": "text", "text": text })),
        ContentPart::Image { image } => Ok(json!({ "type": "image_url", "image_url": image })),
        other => Err(ProviderError::UnsupportedPart(other.kind().to_string())),
    }
}

#[async_trait]
impl ChatProvider for MistralProvider {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_parts_use_flat_url() {
        let part = translate_part(&ContentPart::image("https://x/y.png")).unwrap();
        assert_eq!(part, json!({ "type": "image_url", "image_url": "https://x/y.png" }));
    }

    #[test]
    fn file_parts_are_rejected() {
        let err = translate_part(&ContentPart::File {
            data: "data:application/pdf;base64,JVBE".into(),
            media_type: "application/pdf".into(),
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported part type: file");
    }
}
