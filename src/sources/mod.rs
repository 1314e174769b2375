//! Source adapters: one per external registry
//!
//! Each adapter turns a provider-specific search API into uniform
//! `DiscoveredTool` records, enriched with a readme and a manifest where
//! available. All network traffic goes through the resilience layer.

mod github;
mod npm;

pub use github::GithubSource;
pub use npm::NpmSource;

use crate::error::DiscoveryError;
use crate::types::{ConnectionDescriptor, DiscoveredTool, ManifestData};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Enrichment fetches within one adapter run in concurrent groups this size.
pub(crate) const ENRICH_BATCH_SIZE: usize = 4;

/// Uniform contract every registry adapter implements.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Searches the registry with the adapter's query list and returns up to
    /// `max_results` normalized candidates. A fatal error on the primary
    /// search aborts only this adapter's contribution.
    async fn search(&self, max_results: usize) -> Result<Vec<DiscoveredTool>, DiscoveryError>;

    /// Fetches a single tool by its native identifier.
    async fn fetch_one(&self, native_id: &str) -> Result<Option<DiscoveredTool>, DiscoveryError>;

    fn name(&self) -> &str;
}

/// Dependency name fragments that mark a package as MCP-aware.
const MCP_DEPENDENCY_MARKERS: &[&str] = &["@modelcontextprotocol/sdk", "mcp-sdk", "fastmcp"];

/// Decides MCP support from metadata alone. No network call.
pub(crate) fn detect_mcp_support(
    name: &str,
    description: &str,
    keywords: &[String],
    dependencies: &[String],
) -> bool {
    let haystack = format!("{} {}", name, description).to_lowercase();
    if haystack.contains("model context protocol") || mcp_word().is_match(&haystack) {
        return true;
    }
    if keywords.iter().any(|k| k == "mcp" || k.contains("modelcontextprotocol")) {
        return true;
    }
    dependencies.iter().any(|dep| {
        let dep = dep.to_lowercase();
        MCP_DEPENDENCY_MARKERS.iter().any(|m| dep.contains(m))
    })
}

/// Detects a declared OpenAPI/Swagger surface, the main alternate spec.
pub(crate) fn detect_openapi_spec(name: &str, description: &str, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", name, description).to_lowercase();
    haystack.contains("openapi")
        || haystack.contains("swagger")
        || keywords.iter().any(|k| k == "openapi" || k == "swagger")
}

// Substring matching alone would fire on e.g. "mcprotocol".
fn mcp_word() -> &'static Regex {
    static MCP_WORD: OnceLock<Regex> = OnceLock::new();
    MCP_WORD.get_or_init(|| Regex::new(r"\bmcp\b").unwrap())
}

/// Synthesizes a stdio connection for a package whose manifest declares an
/// executable entry: the standard package runner launches it by name.
pub(crate) fn pre_detect_connection(
    package_name: &str,
    manifest: &ManifestData,
) -> Option<ConnectionDescriptor> {
    if !manifest.has_executable_entry() {
        return None;
    }
    Some(ConnectionDescriptor::Stdio {
        command: "npx".into(),
        args: vec![package_name.to_string()],
        env: HashMap::new(),
    })
}

/// Recency test for the optional max-age filter.
pub(crate) fn is_fresh(
    updated_at: Option<DateTime<Utc>>,
    max_age_months: Option<u32>,
    now: DateTime<Utc>,
) -> bool {
    let Some(months) = max_age_months else {
        return true;
    };
    // A record with no timestamp cannot prove freshness; drop it.
    let Some(updated) = updated_at else {
        return false;
    };
    let cutoff = now - ChronoDuration::days(i64::from(months) * 30);
    updated >= cutoff
}
