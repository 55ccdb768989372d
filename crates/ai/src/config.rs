//! Provider chain configuration loaded from environment variables.

use std::sync::Arc;

use crate::completion::{Completion, FirstProviderPolicy};
use crate::image::OpenAiImageGenerator;
use crate::legacy::{LegacyMistral, LegacyOpenAi};
use crate::provider::ChatProvider;
use crate::providers::{GeminiProvider, MistralProvider, OpenAiProvider};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a boolean (true/false/1/0), got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

/// Which providers are enabled and how to reach them.
///
/// A provider is only added to a chain when its flag is on *and* its API
/// key is set.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub enable_openai: bool,
    pub enable_google: bool,
    pub enable_mistral: bool,
    pub enable_legacy: bool,
    pub policy: FirstProviderPolicy,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `OPENAI_API_KEY`       | unset   |
    /// | `GEMINI_API_KEY`       | unset   |
    /// | `MISTRAL_API_KEY`      | unset   |
    /// | `ENABLE_OPENAI`        | `true`  |
    /// | `ENABLE_GOOGLE`        | `true`  |
    /// | `ENABLE_MISTRAL`       | `true`  |
    /// | `ENABLE_LEGACY`        | `true`  |
    /// | `COMPLETION_FAIL_FAST` | `true`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let flag = |name: &'static str| parse_flag(name, lookup(name), true);

        let policy = if flag("COMPLETION_FAIL_FAST")? {
            FirstProviderPolicy::FailFast
        } else {
            FirstProviderPolicy::TryAll
        };

        Ok(Self {
            openai_api_key: key("OPENAI_API_KEY"),
            gemini_api_key: key("GEMINI_API_KEY"),
            mistral_api_key: key("MISTRAL_API_KEY"),
            enable_openai: flag("ENABLE_OPENAI")?,
            enable_google: flag("ENABLE_GOOGLE")?,
            enable_mistral: flag("ENABLE_MISTRAL")?,
            enable_legacy: flag("ENABLE_LEGACY")?,
            policy,
        })
    }

    /// Assemble the fallback chains: OpenAI, Google, Mistral; then legacy
    /// OpenAI and legacy Mistral.
    pub fn build_completion(&self, client: &reqwest::Client) -> Completion {
        let mut primary: Vec<Arc<dyn ChatProvider>> = Vec::new();
        if let Some(key) = self.openai_api_key.as_ref().filter(|_| self.enable_openai) {
            primary.push(Arc::new(OpenAiProvider::new(client.clone(), key)));
        }
        if let Some(key) = self.gemini_api_key.as_ref().filter(|_| self.enable_google) {
            primary.push(Arc::new(GeminiProvider::new(client.clone(), key)));
        }
        if let Some(key) = self.mistral_api_key.as_ref().filter(|_| self.enable_mistral) {
            primary.push(Arc::new(MistralProvider::new(client.clone(), key)));
        }

        let mut legacy: Vec<Arc<dyn ChatProvider>> = Vec::new();
        if self.enable_legacy {
            if let Some(key) = &self.openai_api_key {
                legacy.push(Arc::new(LegacyOpenAi::new(client.clone(), key)));
            }
            if let Some(key) = &self.mistral_api_key {
                legacy.push(Arc::new(LegacyMistral::new(client.clone(), key)));
            }
        }

        let completion = Completion::new(primary, legacy).with_policy(self.policy);
        tracing::info!(
            primary = ?completion.primary_names(),
            legacy = ?completion.legacy_names(),
            policy = ?self.policy,
            "Completion providers configured",
        );
        completion
    }

    /// Image generation needs an OpenAI key; `None` when it is missing.
    pub fn build_image_generator(&self, client: &reqwest::Client) -> Option<OpenAiImageGenerator> {
        self.openai_api_key
            .as_ref()
            .map(|key| OpenAiImageGenerator::new(client.clone(), key))
    }
}

fn parse_flag(name: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value }),
    }
}
