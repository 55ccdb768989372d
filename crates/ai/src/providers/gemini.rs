//! Google Gemini `generateContent` adapter.

use async_trait::async_trait;
use postpix_core::naming::media_type_for_path;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::send_json;
use crate::message::{parse_data_url, ChatRequest, ContentPart, Role, UserContent};
use crate::provider::{ChatProvider, ObjectSchema, ProviderError};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-latest";

const PROVIDER: &str = "google";

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, GEMINI_BASE_URL, api_key, DEFAULT_GEMINI_MODEL)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn generate(&self, body: &Value) -> Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body);

        let response: GenerateContentResponse = send_json(request, PROVIDER).await?;
        response
            .into_text()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })
    }
}

/// Build the `generateContent` body. The system prompt travels as
/// `systemInstruction`; assistant turns use Gemini's `model` role.
fn request_body(request: &ChatRequest) -> Result<Value, ProviderError> {
    let contents = request
        .messages
        .iter()
        .filter(|message| message.role != Role::System)
        .map(|message| -> Result<Value, ProviderError> {
            let role = match message.role {
                Role::Assistant => "model",
                _ => "user",
            };
            let parts = match &message.content {
                UserContent::Text(text) => vec![json!({ "text": text })],
                UserContent::Parts(parts) => parts
                    .iter()
                    .map(translate_part)
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(json!({ "role": role, "parts": parts }))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "contents": contents,
    }))
}

fn translate_part(part: &ContentPart) -> Result<Value, ProviderError> {
    Ok(match part {
        ContentPart::Text { text } => json!({ "text": text }),
        ContentPart::Image { image } => match parse_data_url(image) {
            Some((media_type, data)) => inline_data(media_type, data),
            None => json!({
                "fileData": { "mimeType": media_type_for_path(image), "fileUri": image }
            }),
        },
        ContentPart::File { data, media_type } => match parse_data_url(data) {
            Some((_, payload)) => inline_data(media_type, payload),
            None => json!({ "fileData": { "mimeType": media_type, "fileUri": data } }),
        },
    })
}

fn inline_data(media_type: &str, data: &str) -> Value {
    json!({ "inlineData": { "mimeType": media_type, "data": data } })
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_text(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = request_body(request)?;
        self.generate(&body).await
    }

    async fn generate_json(
        &self,
        request: &ChatRequest,
        schema: &ObjectSchema,
    ) -> Result<Value, ProviderError> {
        let mut body = request_body(request)?;
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema.schema,
        });
        let text = self.generate(&body).await?;
        serde_json::from_str(&text).map_err(|source| ProviderError::Decode {
            provider: PROVIDER.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        Some(content.parts.into_iter().filter_map(|p| p.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Examples;

    #[test]
    fn system_prompt_moves_to_system_instruction() {
        let mut examples = Examples::new();
        examples.insert("q".into(), "a".into());
        let request = ChatRequest::new("sys", &examples, "final".into());

        let body = request_body(&request).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");

        let roles: Vec<_> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, ["user", "model", "user"]);
    }

    #[test]
    fn data_url_images_are_inlined() {
        let part = translate_part(&ContentPart::image("data:image/webp;base64,UklG")).unwrap();
        assert_eq!(part, json!({ "inlineData": { "mimeType": "image/webp", "data": "UklG" } }));
    }

    #[test]
    fn remote_images_become_file_data() {
        let part = translate_part(&ContentPart::image("https://x/y.JPG?v=2")).unwrap();
        assert_eq!(part["fileData"]["mimeType"], "image/jpeg");
        assert_eq!(part["fileData"]["fileUri"], "https://x/y.JPG?v=2");
    }

    #[test]
    fn candidate_parts_are_joined() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn blocked_response_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert!(response.into_text().is_none());
    }
}
