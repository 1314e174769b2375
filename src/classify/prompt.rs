//! Prompt construction for template classification
//!
//! One fixed instruction template per tool. The readme is truncated to a
//! fixed character budget to bound token cost; manifest content is reduced to
//! the highlights that matter for template choice.

use crate::types::DiscoveredTool;

/// Character budget for embedded readme text.
pub const README_CHAR_BUDGET: usize = 2000;

const INSTRUCTIONS: &str = r#"You are classifying developer tools into integration templates for an AI assistant plugin marketplace.

Choose exactly one template, applying the first rule that fits:
1. "mcp-http" - the tool is an MCP server reachable over HTTP/SSE at a remote endpoint
2. "mcp-stdio" - the tool is an MCP server launched as a local process (npx/node binary)
3. "openapi" - not MCP, but exposes an OpenAPI/Swagger specification
4. "rich-ui" - primarily an interactive user interface or dashboard
5. "markdown" - only produces formatted text/markdown output
6. "configurable-default" - usable as-is but exposes tunable defaults
7. "user-settings" - requires per-user settings before first use
8. "basic-function" - a plain single-purpose function

Respond with ONLY a JSON object, no prose and no code fences, in this shape:
{
  "template": "<one of the eight ids above>",
  "reasoning": "<one or two sentences>",
  "config": <for mcp-http/mcp-stdio: {"identifier": "...", "customParams": {"mcp": {"type": "http", "url": "..."} or {"type": "stdio", "command": "...", "args": [...]}, "description": "..."}}; otherwise: {"identifier": "...", "manifest": "...", "author": "...", "meta": {"title": "...", "description": "...", "tags": [...]}}>
}

The config's connection type MUST match the template: "mcp-http" requires {"type": "http"}, "mcp-stdio" requires {"type": "stdio"}."#;

/// Builds the complete classification prompt for one tool.
pub fn build_classification_prompt(tool: &DiscoveredTool) -> String {
    let mut prompt = String::with_capacity(4096);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n## Tool under classification\n");
    prompt.push_str(&format!("name: {}\n", tool.name));
    prompt.push_str(&format!("description: {}\n", tool.description));
    prompt.push_str(&format!("source: {} ({})\n", tool.source, tool.source_url));
    if let Some(author) = &tool.author {
        prompt.push_str(&format!("author: {author}\n"));
    }

    prompt.push_str("\n## Signals\n");
    prompt.push_str(&format!("declares_mcp_support: {}\n", tool.supports_mcp));
    prompt.push_str(&format!("has_openapi_spec: {}\n", tool.has_openapi_spec));
    prompt.push_str(&format!("has_package_manifest: {}\n", tool.has_manifest));
    if let Some(conn) = &tool.pre_detected_connection {
        if let Ok(json) = serde_json::to_string(conn) {
            prompt.push_str(&format!("pre_detected_connection: {json}\n"));
        }
    }

    if let Some(manifest) = &tool.manifest {
        let deps = manifest.dependency_names();
        if !deps.is_empty() {
            prompt.push_str(&format!("dependencies: {}\n", deps.join(", ")));
        }
        let keywords = manifest.keyword_list();
        if !keywords.is_empty() {
            prompt.push_str(&format!("keywords: {}\n", keywords.join(", ")));
        }
        prompt.push_str(&format!(
            "has_executable_entry: {}\n",
            manifest.has_executable_entry()
        ));
    }

    if let Some(readme) = &tool.readme {
        let excerpt: String = readme.chars().take(README_CHAR_BUDGET).collect();
        prompt.push_str("\n## Readme excerpt\n");
        prompt.push_str(&excerpt);
        prompt.push('\n');
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectionDescriptor, SourceKind};
    use std::collections::HashMap;

    fn sample_tool() -> DiscoveredTool {
        DiscoveredTool {
            id: "npm:example-server".into(),
            name: "example-server".into(),
            description: "An MCP server for examples".into(),
            source: SourceKind::Npm,
            source_url: "https://www.npmjs.com/package/example-server".into(),
            license: None,
            author: Some("dev".into()),
            homepage: None,
            repository_url: None,
            readme: Some("x".repeat(5000)),
            manifest: None,
            manifest_url: None,
            supports_mcp: true,
            has_openapi_spec: false,
            has_manifest: false,
            pre_detected_connection: Some(ConnectionDescriptor::Stdio {
                command: "npx".into(),
                args: vec!["example-server".into()],
                env: HashMap::new(),
            }),
            updated_at: None,
        }
    }

    #[test]
    fn test_prompt_contains_taxonomy_and_tool_facts() {
        let prompt = build_classification_prompt(&sample_tool());
        for id in [
            "mcp-http",
            "mcp-stdio",
            "openapi",
            "rich-ui",
            "markdown",
            "configurable-default",
            "user-settings",
            "basic-function",
        ] {
            assert!(prompt.contains(id), "taxonomy missing {id}");
        }
        assert!(prompt.contains("example-server"));
        assert!(prompt.contains("declares_mcp_support: true"));
        assert!(prompt.contains("pre_detected_connection"));
    }

    #[test]
    fn test_readme_truncated_to_budget() {
        let prompt = build_classification_prompt(&sample_tool());
        let excerpt_len = prompt
            .split("## Readme excerpt\n")
            .nth(1)
            .unwrap()
            .trim_end()
            .len();
        assert_eq!(excerpt_len, README_CHAR_BUDGET);
    }

    #[test]
    fn test_prompt_demands_json_only() {
        let prompt = build_classification_prompt(&sample_tool());
        assert!(prompt.contains("ONLY a JSON object"));
    }
}
