//! Configuration for mcpscout
//!
//! All environment resolution happens here, once, at startup; the resulting
//! struct is passed by reference into the pipeline and engine constructors so
//! the core stays free of global state.
//!
//! # Environment Variables
//!
//! - `MCPSCOUT_PROVIDER`: LLM provider override (openai|anthropic)
//! - `MCPSCOUT_MODEL`: model name override (provider-specific default otherwise)
//! - `MCPSCOUT_KEYWORDS`: comma-separated relevance keyword list
//! - `MCPSCOUT_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "30"
//! - `MCPSCOUT_LOG_LEVEL`: trace|debug|info|warn|error - default: "info"
//! - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`: provider credentials
//! - `GITHUB_TOKEN`: optional, raises GitHub search quota

use crate::classify::ProviderKind;
use std::env;
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Topical keyword set used by the relevance filter unless overridden.
/// Configuration data, not pipeline logic.
const DEFAULT_KEYWORDS: &[&str] = &[
    "mcp",
    "model context protocol",
    "tool server",
    "llm tool",
    "agent",
    "claude",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid provider: {0}. Valid options: openai, anthropic")]
    InvalidProvider(String),

    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Explicit provider choice (e.g. from a CLI flag). Wins over everything.
    pub provider: Option<ProviderKind>,

    /// Provider from `MCPSCOUT_PROVIDER`. Consulted after `provider`.
    pub provider_override: Option<ProviderKind>,

    /// Model name; each provider has its own default when unset.
    pub model: Option<String>,

    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub github_token: Option<String>,

    /// Relevance keyword list for the candidate filter.
    pub relevance_keywords: Vec<String>,

    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub log_level: String,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            provider: None,
            provider_override: None,
            model: None,
            openai_api_key: None,
            anthropic_api_key: None,
            github_token: None,
            relevance_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ScoutConfig {
    /// Resolves configuration from the environment with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_override = match env::var("MCPSCOUT_PROVIDER") {
            Ok(raw) => {
                Some(ProviderKind::parse(&raw).ok_or_else(|| ConfigError::InvalidProvider(raw))?)
            }
            Err(_) => None,
        };

        let relevance_keywords = env::var("MCPSCOUT_KEYWORDS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());

        let request_timeout_secs = env::var("MCPSCOUT_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let log_level = env::var("MCPSCOUT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Ok(Self {
            provider: None,
            provider_override,
            model: env::var("MCPSCOUT_MODEL").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            relevance_keywords,
            request_timeout_secs,
            max_retries: DEFAULT_MAX_RETRIES,
            log_level,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "request timeout cannot exceed 10 minutes".to_string(),
            ));
        }
        if self.max_retries > 10 {
            return Err(ConfigError::ValidationFailed(
                "max retries cannot exceed 10".to_string(),
            ));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationFailed(format!(
                    "invalid log level: {other}. Valid options: trace, debug, info, warn, error"
                )))
            }
        }
        Ok(())
    }

    /// Shared HTTP client with connection pooling and the configured timeout.
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.request_timeout_secs))
            .build()
            .unwrap_or_default()
    }

    pub fn retry_policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy {
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}
