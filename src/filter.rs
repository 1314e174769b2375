//! Merging, deduplication, and relevance filtering
//!
//! Runs entirely in memory after all adapters have returned, so the seen-id
//! set is never shared across concurrent tasks. Dropping irrelevant or
//! MCP-incompatible candidates here avoids spending model quota on them.

use crate::types::DiscoveredTool;
use std::collections::HashSet;
use tracing::debug;

/// How much readme text participates in the relevance test.
const RELEVANCE_README_BUDGET: usize = 2000;

/// Merges per-source lists into one deduplicated list.
///
/// The dedup key is `DiscoveredTool::id`; the first occurrence wins and
/// insertion order is preserved across sources in the order they were
/// requested. Idempotent: merging the output again yields the same list.
pub fn merge_sources(lists: Vec<Vec<DiscoveredTool>>) -> Vec<DiscoveredTool> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for tool in list {
            if seen.insert(tool.id.clone()) {
                merged.push(tool);
            }
        }
    }
    merged
}

/// Keyword-membership relevance test plus MCP-support gate.
///
/// The keyword list is configuration data supplied by the caller; the filter
/// itself is domain-agnostic.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Case-insensitive substring match over name + description + truncated
    /// readme. An empty keyword list admits everything.
    pub fn is_relevant(&self, tool: &DiscoveredTool) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let readme_excerpt: String = tool
            .readme
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(RELEVANCE_README_BUDGET)
            .collect();
        let haystack =
            format!("{} {} {}", tool.name, tool.description, readme_excerpt).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k))
    }

    /// Applies both gates, preserving order. Classification downstream
    /// assumes MCP compatibility for the protocol templates, so tools
    /// without it are dropped outright.
    pub fn apply(&self, tools: Vec<DiscoveredTool>) -> Vec<DiscoveredTool> {
        let before = tools.len();
        let kept: Vec<DiscoveredTool> = tools
            .into_iter()
            .filter(|tool| {
                if !tool.supports_mcp {
                    debug!(id = %tool.id, "dropped: no MCP support");
                    return false;
                }
                if !self.is_relevant(tool) {
                    debug!(id = %tool.id, "dropped: failed relevance test");
                    return false;
                }
                true
            })
            .collect();
        debug!(before, after = kept.len(), "relevance filter applied");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    fn tool(id: &str, name: &str, description: &str, supports_mcp: bool) -> DiscoveredTool {
        DiscoveredTool {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            source: SourceKind::Npm,
            source_url: format!("https://example.com/{name}"),
            license: None,
            author: None,
            homepage: None,
            repository_url: None,
            readme: None,
            manifest: None,
            manifest_url: None,
            supports_mcp,
            has_openapi_spec: false,
            has_manifest: false,
            pre_detected_connection: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_merge_dedup_first_wins() {
        let a = vec![tool("npm:a", "a", "first", true), tool("npm:b", "b", "", true)];
        let b = vec![tool("npm:a", "a", "second", true), tool("npm:c", "c", "", true)];
        let merged = merge_sources(vec![a, b]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].id, "npm:a");
        assert_eq!(merged[0].description, "first");
        assert_eq!(merged[1].id, "npm:b");
        assert_eq!(merged[2].id, "npm:c");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let lists = vec![
            vec![tool("npm:a", "a", "", true), tool("github:x", "x", "", true)],
            vec![tool("npm:a", "a", "", true)],
        ];
        let once = merge_sources(lists);
        let ids: Vec<String> = once.iter().map(|t| t.id.clone()).collect();
        let twice = merge_sources(vec![once]);
        let ids_again: Vec<String> = twice.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn test_relevance_matches_any_field() {
        let filter = RelevanceFilter::new(vec!["weather".into(), "forecast".into()]);
        assert!(filter.is_relevant(&tool("npm:a", "weather-server", "", true)));
        assert!(filter.is_relevant(&tool("npm:b", "b", "Daily FORECAST data", true)));
        let mut with_readme = tool("npm:c", "c", "", true);
        with_readme.readme = Some("## About\nforecast utilities".into());
        assert!(filter.is_relevant(&with_readme));
        assert!(!filter.is_relevant(&tool("npm:d", "calculator", "math", true)));
    }

    #[test]
    fn test_relevance_ignores_readme_past_budget() {
        let filter = RelevanceFilter::new(vec!["needle".into()]);
        let mut t = tool("npm:a", "a", "", true);
        t.readme = Some(format!("{}needle", "x".repeat(RELEVANCE_README_BUDGET)));
        assert!(!filter.is_relevant(&t));
    }

    #[test]
    fn test_apply_drops_non_mcp_tools() {
        let filter = RelevanceFilter::new(vec![]);
        let kept = filter.apply(vec![
            tool("npm:a", "a", "", true),
            tool("npm:b", "b", "", false),
            tool("npm:c", "c", "", true),
        ]);
        let ids: Vec<&str> = kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["npm:a", "npm:c"]);
    }

    #[test]
    fn test_empty_keyword_list_admits_everything() {
        let filter = RelevanceFilter::new(vec![]);
        assert!(filter.is_relevant(&tool("npm:a", "anything", "at all", true)));
    }
}
