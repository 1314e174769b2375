//! GitHub repository-search adapter

use super::{
    detect_mcp_support, detect_openapi_spec, is_fresh, pre_detect_connection, ToolSource,
    ENRICH_BATCH_SIZE,
};
use crate::error::DiscoveryError;
use crate::retry::{resilient_get, RetryPolicy};
use crate::types::{DiscoveredTool, ManifestData, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};

const API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Readme text beyond this is useless for classification and wastes tokens.
const README_FETCH_LIMIT: usize = 10_000;

const DEFAULT_QUERIES: &[&str] = &["mcp server", "model context protocol server"];

pub struct GithubSource {
    client: reqwest::Client,
    token: Option<String>,
    queries: Vec<String>,
    policy: RetryPolicy,
    max_age_months: Option<u32>,
}

impl GithubSource {
    pub fn new(client: reqwest::Client, token: Option<String>) -> Self {
        Self {
            client,
            token,
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            policy: RetryPolicy::default(),
            max_age_months: None,
        }
    }

    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    pub fn with_max_age_months(mut self, months: Option<u32>) -> Self {
        self.max_age_months = months;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("accept", "application/vnd.github+json".to_string()),
            ("user-agent", "mcpscout".to_string()),
        ];
        if let Some(token) = &self.token {
            headers.push(("authorization", format!("Bearer {token}")));
        }
        headers
    }

    async fn run_query(
        &self,
        query: &str,
        per_page: usize,
    ) -> Result<Vec<RepoItem>, DiscoveryError> {
        let url = format!(
            "{API_BASE}/search/repositories?q={}&sort=updated&per_page={}",
            query.replace(' ', "+"),
            per_page.min(100)
        );
        debug!(query, "searching GitHub");
        let response = resilient_get(&self.client, &url, &self.headers(), &self.policy).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("search body: {e}")))?;
        Ok(body.items)
    }

    /// Best-effort fetch of a raw file from the repository head.
    async fn fetch_raw(&self, full_name: &str, path: &str) -> Option<String> {
        let url = format!("{RAW_BASE}/{full_name}/HEAD/{path}");
        match resilient_get(&self.client, &url, &[], &self.policy).await {
            Ok(response) => match response.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    debug!(full_name, path, "raw fetch body failed: {e}");
                    None
                }
            },
            Err(e) => {
                debug!(full_name, path, "raw fetch failed: {e}");
                None
            }
        }
    }

    async fn enrich(&self, item: RepoItem) -> DiscoveredTool {
        let full_name = item.full_name.clone();
        let readme = self
            .fetch_raw(&full_name, "README.md")
            .await
            .map(|text| text.chars().take(README_FETCH_LIMIT).collect::<String>());
        let manifest = self
            .fetch_raw(&full_name, "package.json")
            .await
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .and_then(|value| match value {
                serde_json::Value::Object(map) => Some(ManifestData(map)),
                _ => None,
            });

        let description = item.description.clone().unwrap_or_default();
        let keywords = manifest
            .as_ref()
            .map(|m| m.keyword_list())
            .unwrap_or_default();
        let dependencies = manifest
            .as_ref()
            .map(|m| m.dependency_names())
            .unwrap_or_default();

        let supports_mcp = detect_mcp_support(&item.name, &description, &keywords, &dependencies)
            || readme
                .as_deref()
                .map(|r| r.to_lowercase().contains("model context protocol"))
                .unwrap_or(false);
        let has_openapi_spec = detect_openapi_spec(&item.name, &description, &keywords);
        let pre_detected = manifest
            .as_ref()
            .and_then(|m| pre_detect_connection(&item.name, m));
        let manifest_url = manifest
            .is_some()
            .then(|| format!("{RAW_BASE}/{full_name}/HEAD/package.json"));

        DiscoveredTool {
            id: DiscoveredTool::make_id(SourceKind::Github, &full_name),
            name: item.name,
            description,
            source: SourceKind::Github,
            source_url: item.html_url,
            license: item.license.and_then(|l| l.spdx_id),
            author: item.owner.map(|o| o.login),
            homepage: item.homepage.filter(|h| !h.is_empty()),
            repository_url: Some(format!("https://github.com/{full_name}")),
            readme,
            has_manifest: manifest.is_some(),
            manifest,
            manifest_url,
            supports_mcp,
            has_openapi_spec,
            pre_detected_connection: pre_detected,
            updated_at: item.pushed_at,
        }
    }
}

#[async_trait]
impl ToolSource for GithubSource {
    async fn search(&self, max_results: usize) -> Result<Vec<DiscoveredTool>, DiscoveryError> {
        let mut items: Vec<RepoItem> = Vec::new();
        for query in &self.queries {
            let found = self.run_query(query, max_results).await?;
            debug!(query, count = found.len(), "GitHub query complete");
            for item in found {
                if items.iter().any(|existing| existing.full_name == item.full_name) {
                    continue;
                }
                items.push(item);
            }
        }
        items.truncate(max_results);

        let now = Utc::now();
        let before = items.len();
        items.retain(|item| is_fresh(item.pushed_at, self.max_age_months, now));
        if items.len() < before {
            debug!(dropped = before - items.len(), "dropped stale GitHub candidates");
        }

        let mut tools = Vec::with_capacity(items.len());
        for chunk in items.chunks(ENRICH_BATCH_SIZE) {
            let enriched = join_all(chunk.iter().cloned().map(|item| self.enrich(item))).await;
            tools.extend(enriched);
        }
        info!(count = tools.len(), "GitHub search complete");
        Ok(tools)
    }

    async fn fetch_one(&self, native_id: &str) -> Result<Option<DiscoveredTool>, DiscoveryError> {
        let url = format!("{API_BASE}/repos/{native_id}");
        let response = match resilient_get(&self.client, &url, &self.headers(), &self.policy).await
        {
            Ok(response) => response,
            Err(DiscoveryError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let item: RepoItem = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("repo body: {e}")))?;
        if let Some(months) = self.max_age_months {
            if !is_fresh(item.pushed_at, Some(months), Utc::now()) {
                warn!(native_id, "repository is older than {months} months");
            }
        }
        Ok(Some(self.enrich(item).await))
    }

    fn name(&self) -> &str {
        "github"
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepoItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct RepoItem {
    name: String,
    full_name: String,
    html_url: String,
    description: Option<String>,
    homepage: Option<String>,
    owner: Option<RepoOwner>,
    license: Option<RepoLicense>,
    pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RepoLicense {
    spdx_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_item_deserialization() {
        let raw = r#"{
            "total_count": 1,
            "items": [{
                "name": "weather-mcp",
                "full_name": "octo/weather-mcp",
                "html_url": "https://github.com/octo/weather-mcp",
                "description": "MCP server for weather data",
                "homepage": "",
                "owner": {"login": "octo"},
                "license": {"spdx_id": "MIT"},
                "pushed_at": "2026-05-01T10:00:00Z"
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items.len(), 1);
        let item = &parsed.items[0];
        assert_eq!(item.full_name, "octo/weather-mcp");
        assert_eq!(item.license.as_ref().unwrap().spdx_id.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_default_queries_present() {
        let source = GithubSource::new(reqwest::Client::new(), None);
        assert_eq!(source.queries.len(), 2);
        let source = source.with_queries(vec!["custom".into()]);
        assert_eq!(source.queries, vec!["custom"]);
    }

    #[test]
    fn test_auth_header_only_with_token() {
        let source = GithubSource::new(reqwest::Client::new(), None);
        assert!(!source.headers().iter().any(|(n, _)| *n == "authorization"));

        let source = GithubSource::new(reqwest::Client::new(), Some("tok".into()));
        let headers = source.headers();
        let auth = headers.iter().find(|(n, _)| *n == "authorization").unwrap();
        assert_eq!(auth.1, "Bearer tok");
    }
}
