//! Logging setup for the `strata` binary.
//!
//! # Environment Variables
//!
//! - `STRATA_DEBUG=true|1|yes` - Enable debug logging
//! - `STRATA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific log level
//! - `STRATA_LOG_FORMAT=json|pretty|compact` - Set the output format (default: json)
//!
//! The `[logging]` section of `strata.toml` is used when the environment is
//! silent. Logs go to stderr so that documents printed on stdout stay
//! machine-readable.

use std::env;
use std::sync::Once;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `STRATA_DEBUG`.
pub fn is_debug_enabled() -> bool {
    env::var("STRATA_DEBUG")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

/// Resolve the log level, or `None` when logging was not requested.
pub fn log_level(config: &LoggingConfig) -> Option<&'static str> {
    if let Some(level) = env::var("STRATA_LOG_LEVEL").ok().as_deref().and_then(parse_level) {
        return Some(level);
    }
    if is_debug_enabled() {
        return Some("debug");
    }
    config.level.as_deref().and_then(parse_level)
}

/// Resolve the log format.
pub fn log_format(config: &LoggingConfig) -> &'static str {
    env::var("STRATA_LOG_FORMAT")
        .ok()
        .or_else(|| config.format.clone())
        .map(|f| parse_format(&f))
        .unwrap_or("json")
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: &str) -> Option<&'static str> {
    match value.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn parse_format(value: &str) -> &'static str {
    match value.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let Some(level) = log_level(config) else {
            // No logging requested
            return;
        };

        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::try_new(format!(
            "strata={level},strata_cli={level},strata_migrate={level},strata_schema={level}"
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        let format = log_format(config);
        match format {
            "json" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact().with_writer(std::io::stderr))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
        }

        tracing::debug!(level, format, "Strata logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("Info"), Some("info"));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_parse_format_defaults_to_json() {
        assert_eq!(parse_format("pretty"), "pretty");
        assert_eq!(parse_format("xml"), "json");
    }
}
