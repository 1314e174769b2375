//! Core data model for discovered tools and classification decisions
//!
//! `DiscoveredTool` is the normalized record every source adapter produces.
//! It is created once from a single search/enrichment round-trip and never
//! mutated afterward; the filter and the classification engine only read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Registries a tool can be discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Github,
    Npm,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Github => "github",
            SourceKind::Npm => "npm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(SourceKind::Github),
            "npm" => Some(SourceKind::Npm),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loosely-typed package manifest (package.json or similar).
///
/// Kept as an opaque key/value document with narrow accessors so the rest of
/// the system stays strongly typed without speculating about manifest shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestData(pub serde_json::Map<String, serde_json::Value>);

impl ManifestData {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Whether the manifest declares an executable entry point (`bin`).
    pub fn has_executable_entry(&self) -> bool {
        match self.0.get("bin") {
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            _ => false,
        }
    }

    /// Names of declared runtime dependencies.
    pub fn dependency_names(&self) -> Vec<String> {
        match self.0.get("dependencies") {
            Some(serde_json::Value::Object(deps)) => deps.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Declared `keywords`, lowercased.
    pub fn keyword_list(&self) -> Vec<String> {
        match self.0.get("keywords") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// How to reach an MCP-compatible tool.
///
/// Exactly one variant applies; the `type` tag selects it on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionDescriptor {
    /// Remote server reachable over HTTP.
    Http {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth: Option<AuthDescriptor>,
        #[serde(skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
    },
    /// Local process spawned on demand.
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        env: HashMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthDescriptor {
    None,
    Bearer {
        token: String,
    },
    Oauth2 {
        client_id: String,
        client_secret: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        token_url: Option<String>,
    },
}

/// A normalized candidate tool produced by one source adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredTool {
    /// Stable dedup key: `source:native-id`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: SourceKind,
    pub source_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    /// Raw readme text, possibly truncated. Enrichment is best-effort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,

    /// Derived at adapter time from name/description/keywords/dependencies.
    pub supports_mcp: bool,
    pub has_openapi_spec: bool,
    pub has_manifest: bool,

    /// Connection inferred directly from the manifest, letting simple
    /// packages skip ambiguity before the engine runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_detected_connection: Option<ConnectionDescriptor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DiscoveredTool {
    /// Builds the stable identifier for a native id within a source.
    pub fn make_id(source: SourceKind, native_id: &str) -> String {
        format!("{}:{}", source.as_str(), native_id)
    }
}

/// The closed set of integration templates a tool is classified into,
/// in selection-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    /// MCP server reachable over HTTP.
    McpHttp,
    /// MCP server run as a local process over stdio.
    McpStdio,
    /// Tool exposing an OpenAPI/Swagger spec instead of MCP.
    Openapi,
    /// Interactive UI-heavy application.
    RichUi,
    /// Produces formatted text/markdown output only.
    Markdown,
    /// Works out of the box but exposes tunable defaults.
    ConfigurableDefault,
    /// Requires per-user settings before it is usable.
    UserSettings,
    /// Plain single-purpose function.
    BasicFunction,
}

impl Template {
    /// Whether this template requires an MCP connection descriptor.
    pub fn is_mcp(&self) -> bool {
        matches!(self, Template::McpHttp | Template::McpStdio)
    }

    pub fn all() -> [Template; 8] {
        [
            Template::McpHttp,
            Template::McpStdio,
            Template::Openapi,
            Template::RichUi,
            Template::Markdown,
            Template::ConfigurableDefault,
            Template::UserSettings,
            Template::BasicFunction,
        ]
    }
}

/// MCP-style plugin config: `{identifier, customParams: {mcp, ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPluginConfig {
    pub identifier: String,
    #[serde(rename = "customParams")]
    pub custom_params: McpCustomParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpCustomParams {
    pub mcp: ConnectionDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Standard plugin-index entry for non-MCP templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginIndexConfig {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PluginMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Exactly one of the two config shapes, chosen consistently with the
/// decision's template. The `customParams` key disambiguates on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolConfig {
    Mcp(McpPluginConfig),
    PluginIndex(PluginIndexConfig),
}

impl ToolConfig {
    pub fn identifier(&self) -> &str {
        match self {
            ToolConfig::Mcp(c) => &c.identifier,
            ToolConfig::PluginIndex(c) => &c.identifier,
        }
    }

    pub fn connection(&self) -> Option<&ConnectionDescriptor> {
        match self {
            ToolConfig::Mcp(c) => Some(&c.custom_params.mcp),
            ToolConfig::PluginIndex(_) => None,
        }
    }
}

/// The classification engine's output for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDecision {
    pub template: Template,
    /// Free-text justification, kept for audit only.
    pub reasoning: String,
    pub config: ToolConfig,
}

/// One fully classified tool: the unit returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub tool: DiscoveredTool,
    pub decision: TemplateDecision,
    /// The decision's config serialized to JSON for direct export.
    pub config_payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: serde_json::Value) -> ManifestData {
        match value {
            serde_json::Value::Object(map) => ManifestData(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_manifest_executable_entry() {
        let m = manifest(json!({"bin": {"x": "./cli.js"}}));
        assert!(m.has_executable_entry());

        let m = manifest(json!({"bin": "cli.js"}));
        assert!(m.has_executable_entry());

        let m = manifest(json!({"main": "index.js"}));
        assert!(!m.has_executable_entry());

        let m = manifest(json!({"bin": {}}));
        assert!(!m.has_executable_entry());
    }

    #[test]
    fn test_manifest_dependency_names() {
        let m = manifest(json!({
            "dependencies": {"@modelcontextprotocol/sdk": "^1.0.0", "zod": "^3.0.0"}
        }));
        let mut deps = m.dependency_names();
        deps.sort();
        assert_eq!(deps, vec!["@modelcontextprotocol/sdk", "zod"]);

        assert!(manifest(json!({})).dependency_names().is_empty());
    }

    #[test]
    fn test_manifest_keywords_lowercased() {
        let m = manifest(json!({"keywords": ["MCP", "Server", 42]}));
        assert_eq!(m.keyword_list(), vec!["mcp", "server"]);
    }

    #[test]
    fn test_connection_descriptor_wire_format() {
        let http = ConnectionDescriptor::Http {
            url: "https://mcp.example.com/sse".into(),
            auth: Some(AuthDescriptor::Bearer {
                token: "secret".into(),
            }),
            headers: None,
        };
        let value = serde_json::to_value(&http).unwrap();
        assert_eq!(value["type"], "http");
        assert_eq!(value["auth"]["type"], "bearer");

        let stdio = ConnectionDescriptor::Stdio {
            command: "npx".into(),
            args: vec!["my-server".into()],
            env: HashMap::new(),
        };
        let value = serde_json::to_value(&stdio).unwrap();
        assert_eq!(value["type"], "stdio");
        assert_eq!(value["command"], "npx");
        assert!(value.get("env").is_none());
    }

    #[test]
    fn test_template_serde_names() {
        assert_eq!(
            serde_json::to_value(Template::McpHttp).unwrap(),
            json!("mcp-http")
        );
        assert_eq!(
            serde_json::to_value(Template::BasicFunction).unwrap(),
            json!("basic-function")
        );
        let t: Template = serde_json::from_value(json!("mcp-stdio")).unwrap();
        assert_eq!(t, Template::McpStdio);
    }

    #[test]
    fn test_tool_config_untagged_roundtrip() {
        let raw = json!({
            "identifier": "example-server",
            "customParams": {
                "mcp": {"type": "stdio", "command": "npx", "args": ["example-server"]}
            }
        });
        let config: ToolConfig = serde_json::from_value(raw).unwrap();
        assert!(matches!(config, ToolConfig::Mcp(_)));
        assert!(config.connection().is_some());

        let raw = json!({
            "identifier": "docs-plugin",
            "author": "someone",
            "meta": {"title": "Docs", "description": "Render docs"}
        });
        let config: ToolConfig = serde_json::from_value(raw).unwrap();
        assert!(matches!(config, ToolConfig::PluginIndex(_)));
        assert!(config.connection().is_none());
    }

    #[test]
    fn test_make_id() {
        assert_eq!(
            DiscoveredTool::make_id(SourceKind::Npm, "left-pad"),
            "npm:left-pad"
        );
        assert_eq!(
            DiscoveredTool::make_id(SourceKind::Github, "org/repo"),
            "github:org/repo"
        );
    }
}
