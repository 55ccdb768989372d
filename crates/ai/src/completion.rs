//! Fallback completion across ordered provider chains.
//!
//! Every call walks the chains from the top: no health tracking, no
//! reordering. The first successful response wins.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::message::{ChatRequest, Examples, UserContent};
use crate::provider::{ChatProvider, ObjectSchema};

/// What a failure of the first primary provider does to a text completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstProviderPolicy {
    /// A failing first provider ends the call immediately; neither the
    /// remaining primaries nor the legacy chain are tried.
    #[default]
    FailFast,
    /// Every provider is treated alike and the chains are exhausted.
    TryAll,
}

/// One provider's failure within a completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Every provider tried for the request failed.
    #[error("All models failed")]
    AllModelsFailed { failures: Vec<ProviderFailure> },
}

/// The fallback completion layer.
pub struct Completion {
    primary: Vec<Arc<dyn ChatProvider>>,
    legacy: Vec<Arc<dyn ChatProvider>>,
    policy: FirstProviderPolicy,
}

impl Completion {
    /// An empty `legacy` list disables the legacy tier.
    pub fn new(primary: Vec<Arc<dyn ChatProvider>>, legacy: Vec<Arc<dyn ChatProvider>>) -> Self {
        Self {
            primary,
            legacy,
            policy: FirstProviderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FirstProviderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FirstProviderPolicy {
        self.policy
    }

    pub fn primary_names(&self) -> Vec<&str> {
        self.primary.iter().map(|p| p.name()).collect()
    }

    pub fn legacy_names(&self) -> Vec<&str> {
        self.legacy.iter().map(|p| p.name()).collect()
    }

    /// Generate free text, falling back through primary then legacy providers.
    pub async fn generate_text(
        &self,
        system: &str,
        examples: &Examples,
        user: impl Into<UserContent>,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest::new(system, examples, user.into());
        let mut failures = Vec::new();

        for (index, provider) in self.primary.iter().enumerate() {
            tracing::info!(provider = provider.name(), "Trying model");
            match provider.generate_text(&request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::error!(provider = provider.name(), error = %e, "Model failed");
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                    if index == 0 && self.policy == FirstProviderPolicy::FailFast {
                        return Err(CompletionError::AllModelsFailed { failures });
                    }
                }
            }
        }

        for provider in &self.legacy {
            tracing::info!(provider = provider.name(), "Trying legacy model");
            match provider.generate_text(&request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::error!(provider = provider.name(), error = %e, "Legacy model failed");
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(CompletionError::AllModelsFailed { failures })
    }

    /// Generate an object matching `schema`.
    ///
    /// Only primary providers are tried. A response that does not
    /// deserialize into `T` or fails `T`'s validation counts as that
    /// provider's failure.
    pub async fn generate_object<T>(
        &self,
        system: &str,
        examples: &Examples,
        user: &str,
        schema: &ObjectSchema,
    ) -> Result<T, CompletionError>
    where
        T: DeserializeOwned + Validate,
    {
        let request = ChatRequest::new(system, examples, user.into());
        let mut failures = Vec::new();

        for provider in &self.primary {
            tracing::info!(provider = provider.name(), schema = %schema.name, "Trying model");
            let outcome = match provider.generate_json(&request, schema).await {
                Ok(value) => conform::<T>(value),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(object) => return Ok(object),
                Err(reason) => {
                    tracing::error!(provider = provider.name(), error = %reason, "Model failed");
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(CompletionError::AllModelsFailed { failures })
    }
}

fn conform<T: DeserializeOwned + Validate>(value: serde_json::Value) -> Result<T, String> {
    let object: T =
        serde_json::from_value(value).map_err(|e| format!("Response does not match schema: {e}"))?;
    object
        .validate()
        .map_err(|e| format!("Response failed validation: {e}"))?;
    Ok(object)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Value};

    use super::*;
    use crate::provider::ProviderError;

    /// Scripted provider: `None` means the call fails.
    struct Fake {
        name: &'static str,
        text: Option<&'static str>,
        json: Option<Value>,
        calls: AtomicUsize,
    }

    impl Fake {
        fn text(name: &'static str, text: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                text,
                json: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn json(name: &'static str, json: Value) -> Arc<Self> {
            Arc::new(Self {
                name,
                text: None,
                json: Some(json),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn down(&self) -> ProviderError {
            ProviderError::Api {
                provider: self.name.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for Fake {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate_text(&self, _request: &ChatRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.map(str::to_string).ok_or_else(|| self.down())
        }

        async fn generate_json(
            &self,
            _request: &ChatRequest,
            _schema: &ObjectSchema,
        ) -> Result<Value, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.json.clone().ok_or_else(|| self.down())
        }
    }

    fn chain(providers: &[&Arc<Fake>]) -> Vec<Arc<dyn ChatProvider>> {
        providers
            .iter()
            .map(|p| Arc::clone(*p) as Arc<dyn ChatProvider>)
            .collect()
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Caption {
        #[validate(length(min = 1))]
        text: String,
    }

    fn caption_schema() -> ObjectSchema {
        ObjectSchema {
            name: "caption".into(),
            schema: json!({ "type": "object", "properties": { "text": { "type": "string" } } }),
        }
    }

    #[tokio::test]
    async fn first_success_wins_and_later_providers_are_never_called() {
        let a = Fake::text("a", Some("from a"));
        let b = Fake::text("b", Some("from b"));
        let c = Fake::text("c", Some("from c"));
        let completion = Completion::new(chain(&[&a, &b, &c]), vec![]);

        let text = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap();

        assert_eq!(text, "from a");
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 0, 0));
    }

    #[tokio::test]
    async fn fail_fast_stops_at_failing_first_provider() {
        let a = Fake::text("a", None);
        let b = Fake::text("b", Some("from b"));
        let legacy = Fake::text("legacy", Some("from legacy"));
        let completion = Completion::new(chain(&[&a, &b]), chain(&[&legacy]));
        assert_eq!(completion.policy(), FirstProviderPolicy::FailFast);

        let err = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap_err();

        assert_eq!(err.to_string(), "All models failed");
        assert_matches!(err, CompletionError::AllModelsFailed { failures } if failures.len() == 1 && failures[0].provider == "a");
        assert_eq!((b.calls(), legacy.calls()), (0, 0));
    }

    #[tokio::test]
    async fn try_all_falls_through_to_second_provider() {
        let a = Fake::text("a", None);
        let b = Fake::text("b", Some("from b"));
        let completion =
            Completion::new(chain(&[&a, &b]), vec![]).with_policy(FirstProviderPolicy::TryAll);

        let text = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap();

        assert_eq!(text, "from b");
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn empty_primary_chain_goes_straight_to_legacy() {
        let legacy = Fake::text("legacy", Some("from legacy"));
        let completion = Completion::new(vec![], chain(&[&legacy]));

        let text = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap();

        assert_eq!(text, "from legacy");
    }

    #[tokio::test]
    async fn legacy_chain_runs_after_primaries_are_exhausted() {
        let a = Fake::text("a", None);
        let b = Fake::text("b", None);
        let legacy_one = Fake::text("legacy-one", None);
        let legacy_two = Fake::text("legacy-two", Some("from legacy"));
        let completion = Completion::new(chain(&[&a, &b]), chain(&[&legacy_one, &legacy_two]))
            .with_policy(FirstProviderPolicy::TryAll);

        let text = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap();

        assert_eq!(text, "from legacy");
        assert_eq!(legacy_one.calls(), 1);
    }

    #[tokio::test]
    async fn every_failure_is_reported_in_order() {
        let a = Fake::text("a", None);
        let b = Fake::text("b", None);
        let legacy = Fake::text("legacy", None);
        let completion = Completion::new(chain(&[&a, &b]), chain(&[&legacy]))
            .with_policy(FirstProviderPolicy::TryAll);

        let err = completion.generate_text("sys", &Examples::new(), "hi").await.unwrap_err();

        let CompletionError::AllModelsFailed { failures } = err;
        let names: Vec<_> = failures.iter().map(|f| f.provider.as_str()).collect();
        assert_eq!(names, ["a", "b", "legacy"]);
    }

    #[tokio::test]
    async fn generate_object_skips_invalid_responses() {
        let a = Fake::json("a", json!({ "text": "" }));
        let b = Fake::json("b", json!({ "text": "a cat on a mat" }));
        let completion = Completion::new(chain(&[&a, &b]), vec![]);

        let caption: Caption = completion
            .generate_object("sys", &Examples::new(), "describe", &caption_schema())
            .await
            .unwrap();

        assert_eq!(caption.text, "a cat on a mat");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn generate_object_fails_when_every_response_is_invalid() {
        let a = Fake::json("a", json!({ "text": "" }));
        let b = Fake::json("b", json!({ "wrong": 1 }));
        let completion = Completion::new(chain(&[&a, &b]), vec![]);

        let err = completion
            .generate_object::<Caption>("sys", &Examples::new(), "describe", &caption_schema())
            .await
            .unwrap_err();

        assert_matches!(err, CompletionError::AllModelsFailed { failures } if failures.len() == 2);
    }

    #[tokio::test]
    async fn generate_object_never_uses_legacy_providers() {
        let a = Fake::json("a", json!({ "wrong": 1 }));
        let legacy = Fake::text("legacy", Some("{\"text\":\"x\"}"));
        let completion = Completion::new(chain(&[&a]), chain(&[&legacy]));

        let result = completion
            .generate_object::<Caption>("sys", &Examples::new(), "describe", &caption_schema())
            .await;

        assert!(result.is_err());
        assert_eq!(legacy.calls(), 0);
    }

    #[tokio::test]
    async fn generate_object_first_failure_is_not_fatal() {
        let a = Fake::text("a", None);
        let b = Fake::json("b", json!({ "text": "ok" }));
        let completion = Completion::new(chain(&[&a, &b]), vec![]);
        assert_eq!(completion.policy(), FirstProviderPolicy::FailFast);

        let caption: Caption = completion
            .generate_object("sys", &Examples::new(), "describe", &caption_schema())
            .await
            .unwrap();

        assert_eq!(caption.text, "ok");
    }
}
