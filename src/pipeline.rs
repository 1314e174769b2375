//! Pipeline orchestration: Collecting -> Filtering -> (DryPreview | Classifying) -> Done
//!
//! One invocation discovers a bounded number of items and terminates. Partial
//! failure never aborts a run: a failed source contributes zero items and a
//! failed classification excludes one tool; only systemic problems (no
//! sources, no credentials) propagate.

use crate::classify::ClassificationEngine;
use crate::config::ScoutConfig;
use crate::error::DiscoveryError;
use crate::filter::{merge_sources, RelevanceFilter};
use crate::sources::{GithubSource, NpmSource, ToolSource};
use crate::types::{DiscoveredTool, DiscoveryResult, SourceKind};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Inbound request for one discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub sources: Vec<SourceKind>,
    /// Cap on classified results; applied after filtering so it reflects
    /// usable candidates, not raw search hits.
    pub limit: usize,
    /// Discover and filter only; the classification engine is never touched.
    pub dry_run: bool,
    /// Drop candidates not updated within this many months.
    pub max_age_months: Option<u32>,
    /// Overall bound on the Collecting stage. Sources that miss it simply
    /// contribute nothing.
    #[serde(skip)]
    pub search_deadline: Option<Duration>,
}

impl DiscoveryRequest {
    pub fn new(sources: Vec<SourceKind>, limit: usize) -> Self {
        Self {
            sources,
            limit,
            dry_run: false,
            max_age_months: None,
            search_deadline: None,
        }
    }
}

/// Candidate listing produced by a dry run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source_url: String,
}

impl From<&DiscoveredTool> for CandidateSummary {
    fn from(tool: &DiscoveredTool) -> Self {
        Self {
            id: tool.id.clone(),
            name: tool.name.clone(),
            description: tool.description.clone(),
            source_url: tool.source_url.clone(),
        }
    }
}

/// One tool dropped from the batch, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exclusion {
    pub tool_id: String,
    pub reason: String,
}

/// Everything a run produced: successes, the dry-run preview, and the
/// excluded items so callers can report partial failure.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<DiscoveryResult>,
    pub preview: Vec<CandidateSummary>,
    pub excluded: Vec<Exclusion>,
}

impl RunReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

pub struct DiscoveryPipeline {
    config: ScoutConfig,
    sources: Option<Vec<Arc<dyn ToolSource>>>,
    engine: Option<ClassificationEngine>,
}

impl DiscoveryPipeline {
    pub fn new(config: ScoutConfig) -> Self {
        Self {
            config,
            sources: None,
            engine: None,
        }
    }

    /// Replaces registry adapters, e.g. with fixtures in tests.
    pub fn with_sources(mut self, sources: Vec<Arc<dyn ToolSource>>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Replaces the classification engine, e.g. with a mock provider.
    pub fn with_engine(mut self, engine: ClassificationEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub async fn run(&self, request: &DiscoveryRequest) -> Result<RunReport, DiscoveryError> {
        let sources = match &self.sources {
            Some(sources) => sources.clone(),
            None => self.build_sources(request),
        };
        if sources.is_empty() {
            return Err(DiscoveryError::Configuration(
                "no usable sources requested".into(),
            ));
        }

        // Resolve the engine before spending any search quota: missing
        // credentials would fail every item identically. Dry runs never
        // build one, which is also what keeps them free of model calls.
        let built_engine;
        let engine = if request.dry_run {
            None
        } else {
            Some(match &self.engine {
                Some(engine) => engine,
                None => {
                    built_engine = ClassificationEngine::from_config(&self.config)?;
                    &built_engine
                }
            })
        };

        let candidates = self.collect(&sources, request).await;
        let filtered = self.filter(candidates, request.limit);
        if filtered.is_empty() {
            info!("no candidates survived filtering");
            return Ok(RunReport::default());
        }

        match engine {
            None => {
                info!(count = filtered.len(), "dry run: listing candidates only");
                Ok(RunReport {
                    preview: filtered.iter().map(CandidateSummary::from).collect(),
                    ..Default::default()
                })
            }
            Some(engine) => Ok(self.classify_batch(engine, filtered).await),
        }
    }

    fn build_sources(&self, request: &DiscoveryRequest) -> Vec<Arc<dyn ToolSource>> {
        let client = self.config.http_client();
        let policy = self.config.retry_policy();
        request
            .sources
            .iter()
            .map(|kind| -> Arc<dyn ToolSource> {
                match kind {
                    SourceKind::Github => Arc::new(
                        GithubSource::new(client.clone(), self.config.github_token.clone())
                            .with_max_age_months(request.max_age_months)
                            .with_policy(policy.clone()),
                    ),
                    SourceKind::Npm => Arc::new(
                        NpmSource::new(client.clone())
                            .with_max_age_months(request.max_age_months)
                            .with_policy(policy.clone()),
                    ),
                }
            })
            .collect()
    }

    /// Collecting: sources hit independent quota pools, so their searches run
    /// concurrently. Results are merged only after all complete.
    async fn collect(
        &self,
        sources: &[Arc<dyn ToolSource>],
        request: &DiscoveryRequest,
    ) -> Vec<Vec<DiscoveredTool>> {
        let searches = sources.iter().map(|source| {
            let source = source.clone();
            let deadline = request.search_deadline;
            let limit = request.limit;
            async move {
                let outcome = match deadline {
                    Some(deadline) => {
                        match tokio::time::timeout(deadline, source.search(limit)).await {
                            Ok(result) => result,
                            Err(_) => {
                                warn!(source = source.name(), "search deadline exceeded");
                                Ok(Vec::new())
                            }
                        }
                    }
                    None => source.search(limit).await,
                };
                match outcome {
                    Ok(tools) => {
                        info!(source = source.name(), count = tools.len(), "source complete");
                        tools
                    }
                    Err(e) => {
                        warn!(source = source.name(), "source failed, contributing nothing: {e}");
                        Vec::new()
                    }
                }
            }
        });
        join_all(searches).await
    }

    /// Filtering: dedup, relevance, MCP support, then the cap.
    fn filter(&self, lists: Vec<Vec<DiscoveredTool>>, limit: usize) -> Vec<DiscoveredTool> {
        let merged = merge_sources(lists);
        let filter = RelevanceFilter::new(self.config.relevance_keywords.clone());
        let mut filtered = filter.apply(merged);
        filtered.truncate(limit);
        filtered
    }

    /// Classifying: strictly sequential so per-minute provider limits are
    /// respected deterministically. One bad tool never aborts the batch.
    async fn classify_batch(
        &self,
        engine: &ClassificationEngine,
        candidates: Vec<DiscoveredTool>,
    ) -> RunReport {
        let mut report = RunReport::default();
        for tool in candidates {
            match engine.classify(&tool).await {
                Ok(decision) => {
                    let config_payload =
                        serde_json::to_value(&decision.config).unwrap_or_default();
                    report.results.push(DiscoveryResult {
                        tool,
                        decision,
                        config_payload,
                    });
                }
                Err(e) => {
                    let wrapped = e.for_item(tool.id.clone());
                    warn!("excluding tool from batch: {wrapped}");
                    report.excluded.push(Exclusion {
                        tool_id: tool.id,
                        reason: wrapped.to_string(),
                    });
                }
            }
        }
        info!(
            classified = report.results.len(),
            excluded = report.excluded.len(),
            "run complete"
        );
        report
    }
}
