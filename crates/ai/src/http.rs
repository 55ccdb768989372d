//! Shared HTTP plumbing for provider adapters.

use serde::de::DeserializeOwned;

use crate::provider::ProviderError;

/// Send a request and parse a successful JSON response body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let response = ensure_success(response, provider).await?;
    Ok(response.json::<T>().await?)
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`ProviderError::Api`] carrying the status
/// and body text on failure.
async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
