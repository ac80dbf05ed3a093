//! Remote tier: the `SpecificationSource` seam, its reqwest implementation,
//! and the retry loop around it.
//!
//! The trait exists so the resolver can be exercised against mock sources;
//! the HTTP implementation is wired in by the composition root.

use crate::config::RetryConfig;
use crate::errors::FetchError;
use crate::model::SpecDocument;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One upstream document host. `path` is the section path segment
/// (already normalized), e.g. `"wifi"`; `"toplevel"` names the root
/// document.
#[async_trait]
pub trait SpecificationSource: Send + Sync {
    async fn fetch(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<SpecDocument, FetchError>;
}

/// reqwest-backed source fetching `{base_url}/{path}.json`.
#[derive(Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    async fn fetch_once(&self, path: &str) -> Result<SpecDocument, FetchError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        let value: serde_json::Value = response.json().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::network(format!("body decode failed: {err}"))
            }
        })?;
        Ok(SpecDocument::from_value(value))
    }
}

#[async_trait]
impl SpecificationSource for HttpSource {
    async fn fetch(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<SpecDocument, FetchError> {
        tokio::select! {
            result = self.fetch_once(path) => result,
            _ = cancel.cancelled() => Err(FetchError::Timeout),
        }
    }
}

/// Fetch with exponential backoff. `max_attempts` counts the first try;
/// the delay starts at `base_delay_ms` and doubles. Non-retryable errors
/// (404 in particular) end the loop immediately, so a 404 costs exactly one
/// request. Backoff sleeps are cancellation-aware.
pub async fn fetch_with_retry(
    source: &dyn SpecificationSource,
    path: &str,
    retry: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<SpecDocument, FetchError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut delay_ms = retry.base_delay_ms;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match source.fetch(path, cancel).await {
            Ok(document) => return Ok(document),
            Err(err) => {
                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }
                tracing::debug!(
                    path,
                    attempt,
                    delay_ms,
                    error = %err,
                    "transient fetch failure, backing off"
                );
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                    _ = cancel.cancelled() => return Err(FetchError::Timeout),
                }
                delay_ms = delay_ms.saturating_mul(2);
            }
        }
    }
}
