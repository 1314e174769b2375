//! Logging setup for the mcpscout binary
//!
//! One global `tracing` subscriber, initialized once. Logs go to stderr so
//! stdout stays clean for results. `MCPSCOUT_LOG_JSON=true` switches to JSON
//! lines for structured collection; `RUST_LOG` overrides the default filter.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Parses a log level from a string, defaulting to INFO on anything
/// unrecognized.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Level precedence: explicit flag, then verbosity flags, then
/// `MCPSCOUT_LOG_LEVEL`, then INFO.
fn resolve_level(flag: Option<&str>, verbose: bool, quiet: bool) -> Level {
    if let Some(level_str) = flag {
        return parse_level(level_str);
    }
    if verbose {
        return Level::DEBUG;
    }
    if quiet {
        return Level::ERROR;
    }
    let level_str = env::var("MCPSCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    parse_level(&level_str)
}

/// Initializes the global subscriber from CLI flags and the environment.
/// Subsequent calls are ignored.
pub fn init(flag: Option<&str>, verbose: bool, quiet: bool) {
    INIT.call_once(|| {
        let level = resolve_level(flag, verbose, quiet);
        let use_json = env::var("MCPSCOUT_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("mcpscout={level}").parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap());
        }

        if use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_explicit_flag_wins() {
        assert_eq!(resolve_level(Some("warn"), true, false), Level::WARN);
        assert_eq!(resolve_level(Some("trace"), false, true), Level::TRACE);
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(resolve_level(None, true, false), Level::DEBUG);
        assert_eq!(resolve_level(None, false, true), Level::ERROR);
    }
}
