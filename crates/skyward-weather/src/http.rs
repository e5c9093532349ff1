//! HTTP seam for upstream calls.
//!
//! The orchestrator only sees `HttpClient`; `ReqwestHttpClient` owns the
//! transport details (client timeout, status mapping, JSON decoding).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use skyward_core::{ReqwestErrorExt, TransportError};
use url::Url;

use crate::endpoints::redact;

const USER_AGENT: &str = concat!("skyward/", env!("CARGO_PKG_VERSION"));

/// Fetches JSON documents. Implementations must allow concurrent calls.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, TransportError>;
}

/// Fetch and decode into `T`; a schema mismatch is `BadBody`.
pub async fn get_typed<T: DeserializeOwned>(
    client: &dyn HttpClient,
    url: &Url,
) -> Result<T, TransportError> {
    let value = client.get_json(url).await?;
    serde_json::from_value(value).map_err(|e| TransportError::BadBody(e.to_string()))
}

/// reqwest-backed client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip_all, fields(url = %redact(url)))]
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ReqwestErrorExt::into_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upstream returned {}", status);
            return Err(TransportError::ServerError {
                status: status.as_u16(),
                message: summarize_body(&body, status.canonical_reason()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(ReqwestErrorExt::into_transport_error)?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!("Upstream body is not JSON: {}", e);
            TransportError::BadBody(e.to_string())
        })
    }
}

/// OpenWeather error bodies look like `{"cod":401,"message":"..."}`.
fn summarize_body(body: &str, reason: Option<&str>) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_body_prefers_upstream_message() {
        assert_eq!(
            summarize_body(r#"{"cod":401,"message":"Invalid API key"}"#, Some("Unauthorized")),
            "Invalid API key"
        );
        assert_eq!(summarize_body("<html>", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(summarize_body("", None), "request failed");
    }
}
