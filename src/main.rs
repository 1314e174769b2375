use mcpscout::cli::commands::{CliArgs, Commands};
use mcpscout::cli::handlers::{handle_discover, handle_inspect};
use mcpscout::util::logging;
use mcpscout::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    logging::init(args.log_level.as_deref(), args.verbose, args.quiet);

    debug!("mcpscout v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Discover(discover_args) => handle_discover(discover_args).await,
        Commands::Inspect(inspect_args) => handle_inspect(inspect_args).await,
    };

    std::process::exit(exit_code);
}
