//! Retry with exponential backoff for remote document fetches.
//!
//! Transport failures, `429 Too Many Requests` and `5xx` responses are
//! retried. Every other status is final on the first attempt; a `404` from
//! a content host means the document does not exist and asking again will
//! not change that.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;

use crate::error::FetchError;

/// How often and how patiently a fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry attempts after the initial request.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay, including a server's `Retry-After`.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries at 200ms, 400ms and 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends each request exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << retry.min(16))
            .min(self.max_delay)
    }
}

/// Whether a response status is worth asking again for.
pub(crate) fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `Retry-After` in delta-seconds form. HTTP dates are ignored.
fn retry_after(resp: &reqwest::Response) -> Option<Duration> {
    resp.headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
}

/// GET `uri`, retrying per `policy`. Returns the first successful response.
///
/// # Errors
///
/// [`FetchError::Status`] for a non-retryable status, or for a retryable one
/// that persisted through every attempt. [`FetchError::Http`] when the last
/// attempt failed in transport.
pub(crate) async fn get_with_retry(
    client: &reqwest::Client,
    uri: &str,
    policy: RetryPolicy,
) -> Result<reqwest::Response, FetchError> {
    let mut retry = 0;
    loop {
        let (error, hinted) = match client.get(uri).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let error = FetchError::Status {
                    uri: uri.into(),
                    status: status.as_u16(),
                };
                if !is_retryable(status) {
                    return Err(error);
                }
                (error, retry_after(&resp))
            }
            Err(source) => (
                FetchError::Http {
                    uri: uri.into(),
                    source,
                },
                None,
            ),
        };

        if retry >= policy.max_retries {
            return Err(error);
        }

        let delay = hinted.map_or_else(|| policy.delay(retry), |d| d.min(policy.max_delay));
        retry += 1;
        tracing::warn!(
            %uri,
            attempt = retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "remote fetch failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
