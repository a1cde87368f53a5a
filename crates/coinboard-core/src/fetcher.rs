//! Rate-limited HTTP fetch with bounded retry.

use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::retry::{with_retry, RetryConfig, RetryOutcome};
use crate::throttling::RateLimiter;
use crate::FetchError;

/// Performs upstream GETs. Every attempt consumes one rate-limiter grant for
/// the request's host; transient failures are retried per [`RetryConfig`].
pub struct RetryingFetcher {
    http_client: Arc<dyn HttpClient>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
    clock: Arc<dyn Clock>,
}

impl RetryingFetcher {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        limiter: Arc<RateLimiter>,
        retry: RetryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            limiter,
            retry,
            clock,
        }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Fetches `request` with the configured retry budget.
    pub async fn fetch(&self, request: &HttpRequest) -> RetryOutcome<HttpResponse> {
        self.fetch_with_budget(request, self.retry.max_retries).await
    }

    /// Fetches `request`, retrying at most `max_retries` additional times.
    pub async fn fetch_with_budget(
        &self,
        request: &HttpRequest,
        max_retries: u32,
    ) -> RetryOutcome<HttpResponse> {
        let config = RetryConfig {
            max_retries,
            ..self.retry.clone()
        };
        let host = request.host().unwrap_or_default();

        with_retry(&config, self.clock.as_ref(), |attempt| {
            let host = host.as_str();
            async move { self.attempt(request, host, attempt).await }
        })
        .await
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        host: &str,
        attempt: u32,
    ) -> Result<HttpResponse, FetchError> {
        self.limiter.acquire(host).await;
        debug!(url = %request.url, attempt = attempt + 1, "sending upstream request");

        let response = self
            .http_client
            .execute(request.clone())
            .await
            .map_err(|error| FetchError::Network {
                message: error.message().to_owned(),
                retryable: error.retryable(),
            })?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(FetchError::from_status(response.status))
        }
    }
}

impl std::fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
