use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// Default number of retry attempts
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default delay between retries in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Fallback wait when a 429 carries no usable `Retry-After`
const RATE_LIMIT_WAIT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_delay_ms: u64) -> Self {
        Self {
            attempts: retry_count.max(1),
            delay: Duration::from_millis(retry_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS)
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Send the request built by `build` until it returns a success status.
///
/// Rate limiting waits for `Retry-After` before the next attempt; other
/// failures wait `policy.delay`. The last error is returned once every
/// attempt is spent.
pub async fn send_with_retry(
    backend: &str,
    policy: RetryPolicy,
    build: impl Fn() -> RequestBuilder + Send + Sync,
) -> Result<Response> {
    let mut last_error = None;

    for attempt in 0..policy.attempts {
        debug!(
            "{} request attempt {}/{}",
            backend,
            attempt + 1,
            policy.attempts
        );

        match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after_secs(&response);
                warn!("{} rate limited, retry after {:?}s", backend, retry_after);
                last_error = Some(Error::TranslationRateLimited { retry_after });

                if attempt + 1 < policy.attempts {
                    let wait = retry_after.unwrap_or(RATE_LIMIT_WAIT_SECS);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                continue;
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("{} API error: {} - {}", backend, status, body);
                last_error = Some(Error::TranslationRequest(format!("HTTP {status}: {body}")));
            }
            Err(e) => {
                warn!("{} request failed: {}", backend, e);
                last_error = Some(if e.is_timeout() {
                    Error::TranslationTimeout
                } else {
                    Error::TranslationRequest(e.to_string())
                });
            }
        }

        if attempt + 1 < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    error!("{} failed after {} attempts", backend, policy.attempts);
    Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_always_attempts_once() {
        assert_eq!(RetryPolicy::new(0, 10).attempts, 1);
        assert_eq!(RetryPolicy::default().attempts, DEFAULT_RETRY_COUNT);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_last_error() {
        let client = reqwest::Client::new();
        let result = send_with_retry("test", RetryPolicy::new(2, 1), || {
            client.get("http://127.0.0.1:9/unreachable")
        })
        .await;
        assert!(matches!(
            result,
            Err(Error::TranslationRequest(_) | Error::TranslationTimeout)
        ));
    }
}
