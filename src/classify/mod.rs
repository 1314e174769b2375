//! AI classification engine
//!
//! Builds a provider-agnostic prompt from a tool record, invokes the selected
//! model through the resilience layer, and parses/validates the structured
//! response into a typed decision.

pub mod mock;
pub mod prompt;
pub mod provider;
pub mod response;

pub use mock::MockProvider;
pub use provider::{build_provider, resolve_provider, LlmProvider, ProviderKind};

use crate::config::ScoutConfig;
use crate::error::DiscoveryError;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{DiscoveredTool, TemplateDecision};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ClassificationEngine {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl ClassificationEngine {
    /// Resolves the provider once for the lifetime of this instance.
    pub fn from_config(config: &ScoutConfig) -> Result<Self, DiscoveryError> {
        let provider = build_provider(config)?;
        info!(provider = provider.name(), "classification engine ready");
        Ok(Self {
            provider,
            policy: config.retry_policy(),
        })
    }

    /// For tests and callers that bring their own provider.
    pub fn with_provider(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Classifies one tool into a template decision.
    ///
    /// The model call is retried per policy; parse and validation failures
    /// are final for this tool and surface as typed errors.
    pub async fn classify(&self, tool: &DiscoveredTool) -> Result<TemplateDecision, DiscoveryError> {
        let prompt = prompt::build_classification_prompt(tool);
        debug!(id = %tool.id, prompt_len = prompt.len(), "classifying");

        let text = with_retry(&self.policy, || self.provider.invoke(&prompt)).await?;
        let decision = response::parse_decision(&text)?;
        info!(
            id = %tool.id,
            template = ?decision.template,
            "classified"
        );
        Ok(decision)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Minimal connection-only document for protocol decisions; `None` for
    /// everything else. Pure and deterministic.
    pub fn quick_connection_payload(decision: &TemplateDecision) -> Option<String> {
        let connection = decision.config.connection()?;
        if !decision.template.is_mcp() {
            return None;
        }
        serde_json::to_string(&serde_json::json!({
            "identifier": decision.config.identifier(),
            "connection": connection,
        }))
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceKind, Template};
    use serde_json::json;

    fn sample_tool() -> DiscoveredTool {
        DiscoveredTool {
            id: "npm:example-server".into(),
            name: "example-server".into(),
            description: "An MCP server".into(),
            source: SourceKind::Npm,
            source_url: "https://www.npmjs.com/package/example-server".into(),
            license: None,
            author: None,
            homepage: None,
            repository_url: None,
            readme: None,
            manifest: None,
            manifest_url: None,
            supports_mcp: true,
            has_openapi_spec: false,
            has_manifest: false,
            pre_detected_connection: None,
            updated_at: None,
        }
    }

    fn stdio_decision_text() -> String {
        json!({
            "template": "mcp-stdio",
            "reasoning": "declares a bin entry and the MCP SDK",
            "config": {
                "identifier": "example-server",
                "customParams": {
                    "mcp": {"type": "stdio", "command": "npx", "args": ["example-server"]}
                }
            }
        })
        .to_string()
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_classify_happy_path() {
        let mock = Arc::new(MockProvider::new());
        mock.push_text(stdio_decision_text());
        let engine = ClassificationEngine::with_provider(mock.clone(), fast_policy());

        let decision = engine.classify(&sample_tool()).await.unwrap();
        assert_eq!(decision.template, Template::McpStdio);
        assert_eq!(mock.invocations(), 1);
    }

    #[tokio::test]
    async fn test_classify_retries_rate_limit_then_succeeds() {
        let mock = Arc::new(MockProvider::new());
        mock.push_error(DiscoveryError::RateLimited {
            message: "scripted".into(),
            retry_after: Some(std::time::Duration::from_millis(1)),
        });
        mock.push_text(stdio_decision_text());
        let engine = ClassificationEngine::with_provider(mock.clone(), fast_policy());

        let decision = engine.classify(&sample_tool()).await.unwrap();
        assert_eq!(decision.template, Template::McpStdio);
        assert_eq!(mock.invocations(), 2);
    }

    #[tokio::test]
    async fn test_classify_does_not_retry_parse_failure() {
        let mock = Arc::new(MockProvider::new());
        mock.push_text("Sure, here is the answer: {not json");
        let engine = ClassificationEngine::with_provider(mock.clone(), fast_policy());

        let err = engine.classify(&sample_tool()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::ResponseParse { .. }));
        assert_eq!(mock.invocations(), 1);
    }

    #[test]
    fn test_quick_connection_payload_for_protocol_decision() {
        let decision: TemplateDecision =
            serde_json::from_str(&stdio_decision_text()).unwrap();
        let payload = ClassificationEngine::quick_connection_payload(&decision).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["identifier"], "example-server");
        assert_eq!(value["connection"]["type"], "stdio");
    }

    #[test]
    fn test_quick_connection_payload_none_for_plugin_decision() {
        let decision: TemplateDecision = serde_json::from_value(json!({
            "template": "markdown",
            "reasoning": "text only",
            "config": {"identifier": "docs", "meta": {"title": "Docs", "description": "d"}}
        }))
        .unwrap();
        assert!(ClassificationEngine::quick_connection_payload(&decision).is_none());
    }
}
