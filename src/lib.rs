//! mcpscout - AI-powered discovery and classification of MCP tools
//!
//! This library discovers candidate tools from public registries (GitHub,
//! npm), filters them for relevance, and classifies each one into an
//! integration template using a Large Language Model.
//!
//! # Core Concepts
//!
//! - **Sources**: Pluggable registry adapters that search for candidates and
//!   normalize them into uniform [`DiscoveredTool`] records
//! - **Filtering**: Cross-source dedup and keyword relevance checks that cut
//!   the candidate set down before any model call is made
//! - **Classification**: An LLM provider (OpenAI or Anthropic) assigns each
//!   tool one of eight integration templates and emits a ready-to-use
//!   configuration document
//!
//! # Example Usage
//!
//! ```ignore
//! use mcpscout::{DiscoveryPipeline, DiscoveryRequest, ScoutConfig};
//! use mcpscout::types::SourceKind;
//!
//! async fn discover() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScoutConfig::from_env()?;
//!     config.validate()?;
//!
//!     let pipeline = DiscoveryPipeline::new(config);
//!     let request = DiscoveryRequest::new(vec![SourceKind::Npm], 10);
//!     let report = pipeline.run(&request).await?;
//!
//!     for result in &report.results {
//!         println!("{} -> {:?}", result.tool.id, result.decision.template);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`sources`]: registry adapters and signal detection
//! - [`classify`]: prompt construction, providers, response parsing
//! - [`pipeline`]: run orchestration and reporting

// Public modules
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod retry;
pub mod sources;
pub mod types;
pub mod util;

// Re-export key types for convenient access
pub use classify::{ClassificationEngine, LlmProvider, MockProvider, ProviderKind};
pub use config::{ConfigError, ScoutConfig};
pub use error::DiscoveryError;
pub use pipeline::{DiscoveryPipeline, DiscoveryRequest, RunReport};
pub use sources::{GithubSource, NpmSource, ToolSource};
pub use types::{DiscoveredTool, DiscoveryResult, SourceKind, Template, TemplateDecision};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_matches_package() {
        assert_eq!(NAME, "mcpscout");
    }
}
