use crate::cli::output::OutputFormat;
use crate::types::SourceKind;
use clap::{Parser, Subcommand, ValueEnum};

/// AI-powered discovery and classification of MCP tools
#[derive(Parser, Debug)]
#[command(
    name = "mcpscout",
    about = "Discovers MCP tools from public registries and classifies them with an LLM",
    version,
    long_about = "mcpscout searches GitHub and the npm registry for candidate MCP tools, \
                  filters them for relevance, and classifies each one into an integration \
                  template using an LLM provider (OpenAI or Anthropic)."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Discover and classify tools from the configured sources",
        long_about = "Runs the full pipeline: search the requested sources, filter the \
                      candidates, and classify each survivor into a template.\n\n\
                      Examples:\n  \
                      mcpscout discover\n  \
                      mcpscout discover --sources npm --limit 10\n  \
                      mcpscout discover --dry-run --format json"
    )]
    Discover(DiscoverArgs),

    #[command(
        about = "Fetch one tool by its native identifier",
        long_about = "Looks a single item up directly in one source, bypassing search.\n\n\
                      Examples:\n  \
                      mcpscout inspect npm @modelcontextprotocol/server-filesystem\n  \
                      mcpscout inspect github owner/repo"
    )]
    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DiscoverArgs {
    #[arg(
        short = 's',
        long,
        value_delimiter = ',',
        default_value = "github,npm",
        help = "Comma-separated sources to search (github, npm)"
    )]
    pub sources: Vec<String>,

    #[arg(
        short = 'l',
        long,
        default_value = "25",
        help = "Maximum number of tools to classify"
    )]
    pub limit: usize,

    #[arg(long, help = "List filtered candidates without calling the LLM")]
    pub dry_run: bool,

    #[arg(
        long,
        value_name = "MONTHS",
        help = "Drop candidates not updated within this many months"
    )]
    pub max_age_months: Option<u32>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Deadline for the search stage; slow sources contribute nothing"
    )]
    pub search_timeout: Option<u64>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    #[arg(value_name = "SOURCE", help = "Source to query (github or npm)")]
    pub source: String,

    #[arg(
        value_name = "ID",
        help = "Native identifier (owner/repo for github, package name for npm)"
    )]
    pub native_id: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Parses CLI source names into kinds, rejecting unknown names.
pub fn parse_sources(names: &[String]) -> Result<Vec<SourceKind>, String> {
    names
        .iter()
        .map(|name| {
            SourceKind::parse(name.trim())
                .ok_or_else(|| format!("unknown source '{name}' (expected github or npm)"))
        })
        .collect()
}
