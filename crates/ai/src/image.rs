//! Text-to-image generation.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::http::send_json;
use crate::provider::ProviderError;
use crate::providers::openai::OPENAI_BASE_URL;

pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
/// Landscape output.
pub const DEFAULT_IMAGE_SIZE: &str = "1536x1024";

const PROVIDER: &str = "openai";

/// Raw image bytes plus their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ProviderError>;
}

/// OpenAI Images API client returning base64 payloads.
pub struct OpenAiImageGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

impl OpenAiImageGenerator {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        tracing::debug!(model = %self.model, size = %self.size, "Requesting image generation");

        let request = self
            .client
            .post(format!("{}/images/generations", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "size": self.size,
                "n": 1,
            }));

        let response: ImagesResponse = send_json(request, PROVIDER).await?;
        response.into_image()
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
    #[serde(default)]
    output_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

impl ImagesResponse {
    fn into_image(self) -> Result<GeneratedImage, ProviderError> {
        let encoded = self
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::InvalidImage {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let media_type = match self.output_format.as_deref() {
            Some("jpeg") | Some("jpg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "image/png",
        };

        Ok(GeneratedImage {
            bytes,
            media_type: media_type.to_string(),
        })
    }
}
