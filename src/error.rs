//! Error taxonomy for the discovery pipeline
//!
//! A single closed error enum is used throughout so callers can pattern-match
//! on the kind instead of downcasting. Only `RateLimited` and
//! `TransientNetwork` are retryable; everything else fails fast.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Missing or rejected credentials. Never retried.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Provider rate limit hit. Retried, honoring `retry_after` when present.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// 5xx or connection-level failure. Retried with backoff.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The requested resource does not exist. Never retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote rejected the request itself (4xx other than auth, rate
    /// limit, or not-found). Retrying an identical request cannot succeed.
    #[error("request rejected: {0}")]
    RejectedRequest(String),

    /// The model's text could not be parsed as JSON, even after extracting
    /// the first `{...}` substring. The raw response is kept for diagnostics.
    #[error("model response is not valid JSON: {message}")]
    ResponseParse { message: String, raw: String },

    /// The model's JSON parsed but did not match the decision schema or
    /// violated the template/config consistency invariant.
    #[error("model response failed validation: {message}")]
    ResponseValidation { message: String, raw: String },

    /// Invalid or incomplete configuration (no credentials, no sources, ...).
    /// Indicates systemic failure; aborts the whole run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A retryable error survived every attempt the policy allowed.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<DiscoveryError>,
    },

    /// Wraps an error attributable to a single tool so the batch can continue.
    #[error("analysis of '{tool_id}' failed: {source}")]
    ItemAnalysis {
        tool_id: String,
        #[source]
        source: Box<DiscoveryError>,
    },
}

impl DiscoveryError {
    /// Whether the resilience layer may retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::RateLimited { .. } | DiscoveryError::TransientNetwork(_)
        )
    }

    /// Provider-supplied cooldown hint, if any. Takes precedence over
    /// computed backoff.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DiscoveryError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Attributes this error to a single tool for batch continuation.
    pub fn for_item(self, tool_id: impl Into<String>) -> Self {
        DiscoveryError::ItemAnalysis {
            tool_id: tool_id.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(DiscoveryError::RateLimited {
            message: "slow down".into(),
            retry_after: None,
        }
        .is_retryable());
        assert!(DiscoveryError::TransientNetwork("502".into()).is_retryable());
    }

    #[test]
    fn test_fatal_classes_not_retryable() {
        assert!(!DiscoveryError::Authentication("bad token".into()).is_retryable());
        assert!(!DiscoveryError::NotFound("gone".into()).is_retryable());
        assert!(!DiscoveryError::ResponseParse {
            message: "nope".into(),
            raw: String::new(),
        }
        .is_retryable());
        assert!(!DiscoveryError::Configuration("no keys".into()).is_retryable());
        assert!(!DiscoveryError::RejectedRequest("HTTP 400".into()).is_retryable());
    }

    #[test]
    fn test_retry_after_hint() {
        let err = DiscoveryError::RateLimited {
            message: "429".into(),
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(DiscoveryError::NotFound("x".into()).retry_after(), None);
    }

    #[test]
    fn test_item_wrapping_preserves_source() {
        let err = DiscoveryError::ResponseParse {
            message: "bad".into(),
            raw: "{not json".into(),
        }
        .for_item("npm:left-pad");
        match err {
            DiscoveryError::ItemAnalysis { tool_id, source } => {
                assert_eq!(tool_id, "npm:left-pad");
                assert!(matches!(*source, DiscoveryError::ResponseParse { .. }));
            }
            other => panic!("expected ItemAnalysis, got {other:?}"),
        }
    }
}
