//! Parsing and validation of model responses
//!
//! Parse and validation failures are distinct error kinds: the first means
//! the text was not JSON at all, the second that JSON arrived but violated
//! the decision schema. Both preserve the raw response for diagnostics, and
//! neither ever falls back to a fabricated decision.

use crate::error::DiscoveryError;
use crate::types::{ConnectionDescriptor, Template, TemplateDecision, ToolConfig};
use tracing::{debug, warn};

/// Parses the model's text into a validated `TemplateDecision`.
pub fn parse_decision(response: &str) -> Result<TemplateDecision, DiscoveryError> {
    let decision = parse_json(response)?;
    validate_decision(&decision).map_err(|message| {
        warn!("decision failed validation: {message}");
        DiscoveryError::ResponseValidation {
            message,
            raw: response.to_string(),
        }
    })?;
    Ok(decision)
}

/// Strict parse first; models often wrap JSON in prose or fences, so on
/// failure the first top-level `{...}` substring is extracted and reparsed
/// exactly once.
fn parse_json(response: &str) -> Result<TemplateDecision, DiscoveryError> {
    let trimmed = response.trim();
    match serde_json::from_str::<TemplateDecision>(trimmed) {
        Ok(decision) => Ok(decision),
        Err(first_err) => {
            debug!("strict parse failed ({first_err}), trying substring extraction");
            let candidate = extract_json_object(trimmed).ok_or_else(|| {
                DiscoveryError::ResponseParse {
                    message: "no JSON object found in response".into(),
                    raw: response.to_string(),
                }
            })?;
            serde_json::from_str::<TemplateDecision>(&candidate).map_err(|e| {
                DiscoveryError::ResponseParse {
                    message: e.to_string(),
                    raw: response.to_string(),
                }
            })
        }
    }
}

/// First `{` through last `}`; good enough for a single embedded object.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| text[start..=end].to_string())
}

/// Checks the decision's internal consistency, most importantly the
/// template/connection tagged-union invariant.
pub fn validate_decision(decision: &TemplateDecision) -> Result<(), String> {
    if decision.config.identifier().trim().is_empty() {
        return Err("config identifier is empty".into());
    }

    match (decision.template, &decision.config) {
        (Template::McpHttp, ToolConfig::Mcp(config)) => {
            match &config.custom_params.mcp {
                ConnectionDescriptor::Http { url, .. } if !url.trim().is_empty() => Ok(()),
                ConnectionDescriptor::Http { .. } => {
                    Err("mcp-http connection has an empty url".into())
                }
                ConnectionDescriptor::Stdio { .. } => {
                    Err("template mcp-http requires an http connection, got stdio".into())
                }
            }
        }
        (Template::McpStdio, ToolConfig::Mcp(config)) => {
            match &config.custom_params.mcp {
                ConnectionDescriptor::Stdio { command, .. } if !command.trim().is_empty() => Ok(()),
                ConnectionDescriptor::Stdio { .. } => {
                    Err("mcp-stdio connection has an empty command".into())
                }
                ConnectionDescriptor::Http { .. } => {
                    Err("template mcp-stdio requires a stdio connection, got http".into())
                }
            }
        }
        (template, ToolConfig::Mcp(_)) if !template.is_mcp() => Err(format!(
            "template {} must not carry an mcp connection config",
            serde_json::to_string(&template).unwrap_or_default()
        )),
        (template, ToolConfig::PluginIndex(_)) if template.is_mcp() => Err(format!(
            "template {} requires an mcp connection config",
            serde_json::to_string(&template).unwrap_or_default()
        )),
        _ => Ok(()),
    }
}
