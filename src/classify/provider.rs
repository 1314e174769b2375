//! LLM provider abstraction and deterministic provider selection
//!
//! Two providers are supported, each behind the same one-method trait so the
//! engine never sees provider-specific request or response shapes: both are
//! normalized to a single text payload here.

use crate::config::ScoutConfig;
use crate::error::DiscoveryError;
use crate::retry::{check_response, map_transport_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

const MAX_COMPLETION_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the provider for an engine instance. Pure and deterministic:
/// explicit choice, then environment override, then the only provider with
/// credentials, then the fixed OpenAI default. Silent provider drift would
/// make classification results non-reproducible, so this order is load-bearing.
pub fn resolve_provider(
    explicit: Option<ProviderKind>,
    env_override: Option<ProviderKind>,
    has_openai_key: bool,
    has_anthropic_key: bool,
) -> ProviderKind {
    if let Some(kind) = explicit {
        return kind;
    }
    if let Some(kind) = env_override {
        return kind;
    }
    match (has_openai_key, has_anthropic_key) {
        (true, false) => ProviderKind::OpenAi,
        (false, true) => ProviderKind::Anthropic,
        _ => ProviderKind::OpenAi,
    }
}

/// Minimal seam between the engine and a model API.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one prompt and returns the model's text.
    async fn invoke(&self, prompt: &str) -> Result<String, DiscoveryError>;

    fn name(&self) -> &str;
}

/// Builds the provider selected by `resolve_provider` from configuration.
/// Fails with `Configuration` when the chosen provider has no credential,
/// which callers treat as systemic (nothing downstream could succeed).
pub fn build_provider(config: &ScoutConfig) -> Result<Arc<dyn LlmProvider>, DiscoveryError> {
    let kind = resolve_provider(
        config.provider,
        config.provider_override,
        config.openai_api_key.is_some(),
        config.anthropic_api_key.is_some(),
    );
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());
    let client = config.http_client();

    match kind {
        ProviderKind::OpenAi => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                DiscoveryError::Configuration(
                    "no OpenAI credentials: set OPENAI_API_KEY or select another provider".into(),
                )
            })?;
            Ok(Arc::new(OpenAiProvider::new(client, api_key, model)))
        }
        ProviderKind::Anthropic => {
            let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                DiscoveryError::Configuration(
                    "no Anthropic credentials: set ANTHROPIC_API_KEY or select another provider"
                        .into(),
                )
            })?;
            Ok(Arc::new(AnthropicProvider::new(client, api_key, model)))
        }
    }
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn invoke(&self, prompt: &str) -> Result<String, DiscoveryError> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.2,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling OpenAI");
        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_response(&response)?;

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("completion body: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .ok_or_else(|| DiscoveryError::ResponseParse {
                message: "completion carried no content".into(),
                raw: String::new(),
            })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn invoke(&self, prompt: &str) -> Result<String, DiscoveryError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_COMPLETION_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling Anthropic");
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_response(&response)?;

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("message body: {e}")))?;
        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| DiscoveryError::ResponseParse {
                message: "message carried no text block".into(),
                raw: String::new(),
            })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_choice_wins() {
        let kind = resolve_provider(
            Some(ProviderKind::Anthropic),
            Some(ProviderKind::OpenAi),
            true,
            false,
        );
        assert_eq!(kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_env_override_beats_credentials() {
        let kind = resolve_provider(None, Some(ProviderKind::Anthropic), true, false);
        assert_eq!(kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_single_credential_decides() {
        assert_eq!(
            resolve_provider(None, None, false, true),
            ProviderKind::Anthropic
        );
        assert_eq!(
            resolve_provider(None, None, true, false),
            ProviderKind::OpenAi
        );
    }

    #[test]
    fn test_fixed_default_on_ambiguity() {
        assert_eq!(resolve_provider(None, None, true, true), ProviderKind::OpenAi);
        assert_eq!(resolve_provider(None, None, false, false), ProviderKind::OpenAi);
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::parse("claude"), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::parse("gemini"), None);
    }

    #[test]
    fn test_build_provider_requires_credentials() {
        let config = ScoutConfig::default();
        match build_provider(&config) {
            Err(err) => assert!(matches!(err, DiscoveryError::Configuration(_))),
            Ok(_) => panic!("expected a configuration error without credentials"),
        }
    }

    #[test]
    fn test_anthropic_response_extraction() {
        let raw = r#"{"content": [{"type": "text", "text": "{\"ok\": true}"}]}"#;
        let body: AnthropicResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.content[0].text, "{\"ok\": true}");
    }
}
