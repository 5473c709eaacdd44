//! CLI error types and result alias.

use miette::Diagnostic;
use strata_migrate::{MigrationError, StoreError};
use strata_schema::SnapshotError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(strata::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(strata::config))]
    Config(String),

    /// Snapshot file could not be read
    #[error("Snapshot error: {0}")]
    #[diagnostic(code(strata::snapshot))]
    Snapshot(#[from] SnapshotError),

    /// JSON payload could not be read or written
    #[error("JSON error: {0}")]
    #[diagnostic(code(strata::json))]
    Json(#[from] serde_json::Error),

    /// Schema service rejected the request
    #[error("{0}")]
    #[diagnostic(code(strata::migration))]
    Migration(#[from] MigrationError),

    /// Live schema storage failed
    #[error("Store error: {0}")]
    #[diagnostic(code(strata::store))]
    Store(#[from] StoreError),

    /// Command error
    #[error("Command error: {0}")]
    #[diagnostic(code(strata::command))]
    Command(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config(format!("Failed to serialize TOML: {}", err))
    }
}
