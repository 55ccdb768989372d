//! Wire client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Both OpenAI and Mistral speak this protocol; they differ only in how
//! content parts are tagged, which each adapter supplies as a translator.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::send_json;
use crate::message::{ChatRequest, ContentPart, UserContent};
use crate::provider::ProviderError;

/// HTTP client bound to one provider's chat completions endpoint.
pub(crate) struct ChatCompletionsClient {
    provider: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        provider: impl Into<String>,
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub(crate) fn provider(&self) -> &str {
        &self.provider
    }

    /// `POST {base_url}/chat/completions` and return the first choice's text.
    pub(crate) async fn complete(&self, body: &Value) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(body);

        let response: CompletionResponse = send_json(request, &self.provider).await?;
        response
            .into_text()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: self.provider.clone(),
            })
    }

    /// Complete and parse the reply as JSON.
    pub(crate) async fn complete_json(&self, body: &Value) -> Result<Value, ProviderError> {
        let text = self.complete(body).await?;
        serde_json::from_str(&text).map_err(|source| ProviderError::Decode {
            provider: self.provider.clone(),
            source,
        })
    }
}

/// Translate a request into `messages` using `translate_part` for every
/// multi-part payload. Plain-text content is sent as a bare string.
pub(crate) fn wire_messages<F>(request: &ChatRequest, translate_part: F) -> Result<Vec<Value>, ProviderError>
where
    F: Fn(&ContentPart) -> Result<Value, ProviderError>,
{
    request
        .messages
        .iter()
        .map(|message| -> Result<Value, ProviderError> {
            let content = match &message.content {
                UserContent::Text(text) => Value::String(text.clone()),
                UserContent::Parts(parts) => Value::Array(
                    parts
                        .iter()
                        .map(&translate_part)
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            };
            Ok(json!({ "role": message.role.as_str(), "content": content }))
        })
        .collect()
}

/// `response_format` requesting output that matches `schema`.
pub(crate) fn json_schema_format(name: &str, schema: &Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "schema": schema,
        },
    })
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

/// OpenAI returns a string; Mistral may return a list of text chunks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Chunks(Vec<TextChunk>),
}

#[derive(Debug, Deserialize)]
struct TextChunk {
    #[serde(default)]
    text: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> Option<String> {
        let content = self.choices.into_iter().next()?.message.content?;
        Some(match content {
            MessageContent::Text(text) => text,
            MessageContent::Chunks(chunks) => chunks.into_iter().filter_map(|c| c.text).collect(),
        })
    }
}
