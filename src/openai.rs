//! Minimal client for OpenAI-compatible JSON endpoints.
//!
//! Shared by the embedding and completion gateways. Requests are retried
//! with exponential backoff on transient failures:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Failures surface as [`GatewayError`] wrapped in `anyhow::Error`.

use anyhow::{bail, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use librarian_core::GatewayError;

const SERVICE: &str = "OpenAI";

/// Authenticated JSON client bound to one base URL.
#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    backoff: Duration,
}

impl OpenAIClient {
    pub fn new(base_url: &str, api_key: String, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries,
            backoff: Duration::from_secs(1),
        })
    }

    /// Like [`OpenAIClient::new`], reading the key from `OPENAI_API_KEY`.
    pub fn from_env(base_url: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("OPENAI_API_KEY environment variable not set"),
        };
        Self::new(base_url, api_key, timeout_secs, max_retries)
    }

    /// Override the first backoff delay; later delays double from it.
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff = base;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff * (1u32 << (attempt - 1).min(5))
    }

    /// POST `body` to `{base_url}/{path}` and return the JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.delay(attempt);
                if let Some(err) = &last_err {
                    warn!(%url, attempt, ?delay, error = %err, "retrying request");
                }
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let err = match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!(%url, %status, "request succeeded");
                        return response.json::<Value>().await.map_err(|e| {
                            anyhow::Error::from(GatewayError::malformed(
                                SERVICE,
                                format!("body is not JSON: {}", e),
                            ))
                        });
                    }
                    GatewayError::Status {
                        service: SERVICE.to_string(),
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    }
                }
                Err(e) => GatewayError::Transport {
                    service: SERVICE.to_string(),
                    message: e.to_string(),
                },
            };

            if !err.is_transient() {
                return Err(err.into());
            }
            last_err = Some(err);
        }

        Err(last_err
            .map(anyhow::Error::from)
            .unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", SERVICE)))
    }
}
