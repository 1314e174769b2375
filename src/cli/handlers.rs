//! Command handlers
//!
//! Each handler returns a process exit code; errors are logged, not
//! propagated, so the binary boundary stays uniform.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::error;

use super::commands::{parse_sources, DiscoverArgs, InspectArgs};
use super::output::OutputFormatter;
use crate::config::ScoutConfig;
use crate::pipeline::{DiscoveryPipeline, DiscoveryRequest};
use crate::sources::{GithubSource, NpmSource, ToolSource};
use crate::types::SourceKind;

pub async fn handle_discover(args: &DiscoverArgs) -> i32 {
    match run_discover(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("discover failed: {e:#}");
            1
        }
    }
}

pub async fn handle_inspect(args: &InspectArgs) -> i32 {
    match run_inspect(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("inspect failed: {e:#}");
            1
        }
    }
}

async fn run_discover(args: &DiscoverArgs) -> Result<()> {
    let config = ScoutConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let kinds = parse_sources(&args.sources).map_err(anyhow::Error::msg)?;
    let mut request = DiscoveryRequest::new(kinds, args.limit);
    request.dry_run = args.dry_run;
    request.max_age_months = args.max_age_months;
    request.search_deadline = args.search_timeout.map(Duration::from_secs);

    let pipeline = DiscoveryPipeline::new(config);
    let report = pipeline.run(&request).await?;

    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}

async fn run_inspect(args: &InspectArgs) -> Result<()> {
    let config = ScoutConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let kind = SourceKind::parse(&args.source)
        .with_context(|| format!("unknown source '{}' (expected github or npm)", args.source))?;

    let client = config.http_client();
    let policy = config.retry_policy();
    let source: Box<dyn ToolSource> = match kind {
        SourceKind::Github => Box::new(
            GithubSource::new(client, config.github_token.clone()).with_policy(policy),
        ),
        SourceKind::Npm => Box::new(NpmSource::new(client).with_policy(policy)),
    };

    match source.fetch_one(&args.native_id).await? {
        Some(tool) => {
            let formatter = OutputFormatter::new(args.format.into());
            println!("{}", formatter.format_tool(&tool)?);
            Ok(())
        }
        None => bail!("'{}' not found in {}", args.native_id, args.source),
    }
}
