//! Output formatting for discovery results
//!
//! JSON output is the full report serialization; human output is a compact
//! listing meant for a terminal.

use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::pipeline::RunReport;
use crate::types::DiscoveredTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")
            }
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    pub fn format_tool(&self, tool: &DiscoveredTool) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(tool).context("Failed to serialize tool as JSON")
            }
            OutputFormat::Human => Ok(self.format_tool_human(tool)),
        }
    }

    fn format_report_human(&self, report: &RunReport) -> String {
        let mut out = String::new();

        if !report.preview.is_empty() {
            let _ = writeln!(out, "Candidates ({}):", report.preview.len());
            for candidate in &report.preview {
                let _ = writeln!(out, "  {} - {}", candidate.id, candidate.name);
                if !candidate.description.is_empty() {
                    let _ = writeln!(out, "      {}", candidate.description);
                }
                let _ = writeln!(out, "      {}", candidate.source_url);
            }
            return out;
        }

        let _ = writeln!(out, "Classified ({}):", report.results.len());
        for result in &report.results {
            let template = serde_json::to_value(result.decision.template)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} -> {} ({})",
                result.tool.id,
                template,
                result.decision.config.identifier()
            );
            if !result.decision.reasoning.is_empty() {
                let _ = writeln!(out, "      {}", result.decision.reasoning);
            }
        }

        if !report.excluded.is_empty() {
            let _ = writeln!(out, "Excluded ({}):", report.excluded.len());
            for exclusion in &report.excluded {
                let _ = writeln!(out, "  {} - {}", exclusion.tool_id, exclusion.reason);
            }
        }

        out
    }

    fn format_tool_human(&self, tool: &DiscoveredTool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "id:          {}", tool.id);
        let _ = writeln!(out, "name:        {}", tool.name);
        let _ = writeln!(out, "description: {}", tool.description);
        let _ = writeln!(out, "source:      {} ({})", tool.source, tool.source_url);
        if let Some(license) = &tool.license {
            let _ = writeln!(out, "license:     {license}");
        }
        if let Some(author) = &tool.author {
            let _ = writeln!(out, "author:      {author}");
        }
        let _ = writeln!(out, "mcp support: {}", tool.supports_mcp);
        let _ = writeln!(out, "openapi:     {}", tool.has_openapi_spec);
        if let Some(conn) = &tool.pre_detected_connection {
            if let Ok(json) = serde_json::to_string(conn) {
                let _ = writeln!(out, "connection:  {json}");
            }
        }
        if let Some(updated_at) = &tool.updated_at {
            let _ = writeln!(out, "updated:     {}", updated_at.to_rfc3339());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CandidateSummary, Exclusion};
    use crate::types::SourceKind;

    fn sample_report() -> RunReport {
        RunReport {
            results: vec![],
            preview: vec![CandidateSummary {
                id: "npm:example".into(),
                name: "example".into(),
                description: "An MCP server".into(),
                source_url: "https://www.npmjs.com/package/example".into(),
            }],
            excluded: vec![Exclusion {
                tool_id: "npm:bad".into(),
                reason: "analysis failed".into(),
            }],
        }
    }

    #[test]
    fn test_json_report_roundtrips() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let text = formatter.format_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["preview"][0]["id"], "npm:example");
    }

    #[test]
    fn test_human_report_lists_candidates() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let text = formatter.format_report(&sample_report()).unwrap();
        assert!(text.contains("Candidates (1):"));
        assert!(text.contains("npm:example"));
    }

    #[test]
    fn test_human_tool_listing() {
        let tool = DiscoveredTool {
            id: "npm:example".into(),
            name: "example".into(),
            description: "An MCP server".into(),
            source: SourceKind::Npm,
            source_url: "https://www.npmjs.com/package/example".into(),
            license: Some("MIT".into()),
            author: None,
            homepage: None,
            repository_url: None,
            readme: None,
            manifest: None,
            manifest_url: None,
            supports_mcp: true,
            has_openapi_spec: false,
            has_manifest: true,
            pre_detected_connection: None,
            updated_at: None,
        };
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let text = formatter.format_tool(&tool).unwrap();
        assert!(text.contains("npm:example"));
        assert!(text.contains("MIT"));
        assert!(text.contains("mcp support: true"));
    }
}
