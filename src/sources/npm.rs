//! npm registry adapter

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
use tracing::{debug, info};

const REGISTRY_BASE: &str = "https://registry.npmjs.org";

const README_FETCH_LIMIT: usize = 10_000;

const DEFAULT_QUERIES: &[&str] = &["mcp-server", "modelcontextprotocol"];

pub struct NpmSource {
    client: reqwest::Client,
    queries: Vec<String>,
    policy: RetryPolicy,
    max_age_months: Option<u32>,
}

impl NpmSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
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

    async fn run_query(
        &self,
        query: &str,
        size: usize,
    ) -> Result<Vec<PackageSummary>, DiscoveryError> {
        let url = format!(
            "{REGISTRY_BASE}/-/v1/search?text={}&size={}",
            query.replace(' ', "+"),
            size.min(250)
        );
        debug!(query, "searching npm");
        let response = resilient_get(&self.client, &url, &[], &self.policy).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("search body: {e}")))?;
        Ok(body.objects.into_iter().map(|o| o.package).collect())
    }

    /// Packument root; carries the rendered readme.
    async fn fetch_packument(&self, name: &str) -> Option<Packument> {
        let url = format!("{REGISTRY_BASE}/{name}");
        match resilient_get(&self.client, &url, &[], &self.policy).await {
            Ok(response) => response.json::<Packument>().await.ok(),
            Err(e) => {
                debug!(name, "packument fetch failed: {e}");
                None
            }
        }
    }

    /// Full manifest of the latest published version.
    async fn fetch_manifest(&self, name: &str) -> Option<ManifestData> {
        let url = format!("{REGISTRY_BASE}/{name}/latest");
        match resilient_get(&self.client, &url, &[], &self.policy).await {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(serde_json::Value::Object(map)) => Some(ManifestData(map)),
                _ => None,
            },
            Err(e) => {
                debug!(name, "manifest fetch failed: {e}");
                None
            }
        }
    }

    async fn enrich(&self, summary: PackageSummary) -> DiscoveredTool {
        let name = summary.name.clone();
        let packument = self.fetch_packument(&name).await;
        let manifest = self.fetch_manifest(&name).await;

        let readme = packument
            .as_ref()
            .and_then(|p| p.readme.clone())
            .filter(|r| !r.is_empty())
            .map(|r| r.chars().take(README_FETCH_LIMIT).collect::<String>());

        let description = summary.description.clone().unwrap_or_default();
        let keywords: Vec<String> = summary
            .keywords
            .iter()
            .map(|k| k.to_lowercase())
            .chain(manifest.as_ref().map(|m| m.keyword_list()).unwrap_or_default())
            .collect();
        let dependencies = manifest
            .as_ref()
            .map(|m| m.dependency_names())
            .unwrap_or_default();

        let supports_mcp = detect_mcp_support(&name, &description, &keywords, &dependencies);
        let has_openapi_spec = detect_openapi_spec(&name, &description, &keywords);
        let pre_detected = manifest.as_ref().and_then(|m| pre_detect_connection(&name, m));
        let license = manifest
            .as_ref()
            .and_then(|m| m.get("license"))
            .and_then(|v| v.as_str())
            .map(String::from);
        let manifest_url = manifest
            .is_some()
            .then(|| format!("{REGISTRY_BASE}/{name}/latest"));

        DiscoveredTool {
            id: DiscoveredTool::make_id(SourceKind::Npm, &name),
            source_url: summary
                .links
                .as_ref()
                .and_then(|l| l.npm.clone())
                .unwrap_or_else(|| format!("https://www.npmjs.com/package/{name}")),
            description,
            source: SourceKind::Npm,
            license,
            author: summary.author.and_then(|a| a.name),
            homepage: summary.links.as_ref().and_then(|l| l.homepage.clone()),
            repository_url: summary.links.as_ref().and_then(|l| l.repository.clone()),
            readme,
            has_manifest: manifest.is_some(),
            manifest,
            manifest_url,
            supports_mcp,
            has_openapi_spec,
            pre_detected_connection: pre_detected,
            updated_at: summary.date,
            name,
        }
    }
}

#[async_trait]
impl ToolSource for NpmSource {
    async fn search(&self, max_results: usize) -> Result<Vec<DiscoveredTool>, DiscoveryError> {
        let mut summaries: Vec<PackageSummary> = Vec::new();
        for query in &self.queries {
            let found = self.run_query(query, max_results).await?;
            debug!(query, count = found.len(), "npm query complete");
            for summary in found {
                if summaries.iter().any(|existing| existing.name == summary.name) {
                    continue;
                }
                summaries.push(summary);
            }
        }
        summaries.truncate(max_results);

        let now = Utc::now();
        let before = summaries.len();
        summaries.retain(|s| is_fresh(s.date, self.max_age_months, now));
        if summaries.len() < before {
            debug!(dropped = before - summaries.len(), "dropped stale npm candidates");
        }

        let mut tools = Vec::with_capacity(summaries.len());
        for chunk in summaries.chunks(ENRICH_BATCH_SIZE) {
            let enriched = join_all(chunk.iter().cloned().map(|s| self.enrich(s))).await;
            tools.extend(enriched);
        }
        info!(count = tools.len(), "npm search complete");
        Ok(tools)
    }

    async fn fetch_one(&self, native_id: &str) -> Result<Option<DiscoveredTool>, DiscoveryError> {
        let url = format!("{REGISTRY_BASE}/{native_id}");
        let response = match resilient_get(&self.client, &url, &[], &self.policy).await {
            Ok(response) => response,
            Err(DiscoveryError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let packument: Packument = response
            .json()
            .await
            .map_err(|e| DiscoveryError::TransientNetwork(format!("packument body: {e}")))?;
        let summary = PackageSummary {
            name: native_id.to_string(),
            description: packument.description.clone(),
            keywords: Vec::new(),
            date: packument.latest_modified(),
            author: None,
            links: None,
        };
        Ok(Some(self.enrich(summary).await))
    }

    fn name(&self) -> &str {
        "npm"
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Vec<SearchObject>,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: PackageSummary,
}

#[derive(Debug, Clone, Deserialize)]
struct PackageSummary {
    name: String,
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    date: Option<DateTime<Utc>>,
    author: Option<PackageAuthor>,
    links: Option<PackageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
struct PackageAuthor {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PackageLinks {
    npm: Option<String>,
    homepage: Option<String>,
    repository: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Packument {
    description: Option<String>,
    readme: Option<String>,
    #[serde(default)]
    time: std::collections::HashMap<String, DateTime<Utc>>,
}

impl Packument {
    fn latest_modified(&self) -> Option<DateTime<Utc>> {
        self.time.get("modified").copied()
    }
}
