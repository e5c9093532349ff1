//! Retry wrapper for HTTP clients with exponential backoff.
//!
//! Retries transient failures only:
//! - unreachable upstream (connect errors, timeouts)
//! - 5xx, 408 and 429 responses
//!
//! Other 4xx responses and undecodable bodies fail immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skyward_core::TransportError;
use url::Url;

use crate::endpoints::redact;
use crate::http::HttpClient;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 250;
pub const DEFAULT_MAX_DELAY_MS: u64 = 4000;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based): initial * 2^attempt, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps any `HttpClient` with retry on transient failures.
pub struct RetryingHttpClient {
    inner: Arc<dyn HttpClient>,
    config: RetryConfig,
}

impl RetryingHttpClient {
    pub fn new(inner: Arc<dyn HttpClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl HttpClient for RetryingHttpClient {
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, TransportError> {
        let mut attempt = 0;

        loop {
            match self.inner.get_json(url).await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!("Request succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Retryable error for {} (attempt {} of {}), waiting {:?}: {}",
                        redact(url),
                        attempt,
                        self.config.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!("All {} attempts exhausted", self.config.max_retries + 1);
                    }
                    return Err(e);
                }
            }
        }
    }
}
