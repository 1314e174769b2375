//! Resilience layer: retry with backoff for every outbound call
//!
//! Only rate-limit and transient network failures are retried; auth,
//! not-found, and parse/validation errors propagate on first occurrence
//! since retrying them wastes quota and cannot succeed. A provider-supplied
//! retry-after hint always takes precedence over the computed backoff.

use crate::error::DiscoveryError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy shared by all resilient calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first (so an operation runs at most
    /// `max_retries + 1` times).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

/// Computes the backoff delay for the given attempt (0-based).
///
/// delay = min(base * 2^attempt * (1 + jitter), max) with jitter in [0, 0.3).
/// Doubling always outruns the jitter band, so the result is non-decreasing
/// in `attempt` and never exceeds `max_delay`.
pub fn calculate_backoff(attempt: u32, policy: &RetryPolicy) -> Duration {
    let exp = 2u64.saturating_pow(attempt.min(31));
    let base_ms = policy.base_delay.as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0.0..0.3);
    let delay_ms = (base_ms.saturating_mul(exp) as f64 * (1.0 + jitter)) as u64;
    Duration::from_millis(delay_ms).min(policy.max_delay)
}

/// Runs `op` until it succeeds, fails fatally, or the policy is exhausted.
///
/// Retryable failures are fully resolved here: callers only ever see final
/// outcomes. Exhausting the policy re-raises the last error wrapped in
/// `RetriesExhausted`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, DiscoveryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DiscoveryError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt >= policy.max_retries {
                    warn!("giving up after {} attempts: {}", attempt + 1, err);
                    return Err(DiscoveryError::RetriesExhausted {
                        attempts: attempt + 1,
                        source: Box::new(err),
                    });
                }
                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| calculate_backoff(attempt, policy));
                debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retryable failure, backing off: {}",
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Classifies an HTTP outcome into the error taxonomy.
///
/// Pure over extracted header values so it is testable without a live
/// response. Returns `None` for success statuses.
///
/// 429 is always a rate limit. 403 is a rate limit only when the
/// remaining-quota header reads zero (GitHub reports secondary limits this
/// way); any other 403 is a permission error and must not be retried.
pub fn classify_status(
    status: u16,
    retry_after_secs: Option<u64>,
    rate_remaining: Option<&str>,
) -> Option<DiscoveryError> {
    match status {
        200..=299 => None,
        429 => Some(DiscoveryError::RateLimited {
            message: "HTTP 429".into(),
            retry_after: retry_after_secs.map(Duration::from_secs),
        }),
        403 if rate_remaining == Some("0") => Some(DiscoveryError::RateLimited {
            message: "HTTP 403 with exhausted quota".into(),
            retry_after: retry_after_secs.map(Duration::from_secs),
        }),
        401 | 403 => Some(DiscoveryError::Authentication(format!("HTTP {status}"))),
        404 => Some(DiscoveryError::NotFound("HTTP 404".into())),
        500..=599 => Some(DiscoveryError::TransientNetwork(format!("HTTP {status}"))),
        // 400/422 and other surprises: the request itself is wrong, so a
        // retry would only replay the failure.
        other => Some(DiscoveryError::RejectedRequest(format!(
            "unexpected HTTP status {other}"
        ))),
    }
}

/// Converts a completed `reqwest` response into `Ok` or a classified error.
pub fn check_response(response: &reqwest::Response) -> Result<(), DiscoveryError> {
    let headers = response.headers();
    let retry_after = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());
    match classify_status(response.status().as_u16(), retry_after, remaining) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// Maps transport-level `reqwest` errors into the taxonomy.
pub fn map_transport_error(err: reqwest::Error) -> DiscoveryError {
    if err.is_timeout() {
        DiscoveryError::TransientNetwork(format!("request timed out: {err}"))
    } else if err.is_connect() {
        DiscoveryError::TransientNetwork(format!("connection failed: {err}"))
    } else {
        DiscoveryError::TransientNetwork(format!("request failed: {err}"))
    }
}

/// Issues a GET with retry, rebuilding the request on each attempt.
pub async fn resilient_get(
    client: &reqwest::Client,
    url: &str,
    headers: &[(&str, String)],
    policy: &RetryPolicy,
) -> Result<reqwest::Response, DiscoveryError> {
    with_retry(policy, || async {
        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        check_response(&response)?;
        Ok(response)
    })
    .await
}
