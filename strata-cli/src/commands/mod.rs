//! CLI command implementations.

pub mod apply;
pub mod diff;
pub mod hash;
pub mod init;
pub mod snapshot;
pub mod version;

use std::path::Path;

use serde_json::Value;
use strata_migrate::SchemaService;
use strata_schema::Snapshot;

use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::store::FileSchemaStore;

/// Build the schema service described by the config file at `config_path`.
pub(crate) fn service(config_path: &Path) -> CliResult<SchemaService<FileSchemaStore>> {
    let config = Config::load(config_path)?;
    let store = FileSchemaStore::new(config.store_path(config_path));

    Ok(SchemaService::new(store)
        .with_accountability(config.accountability.accountability())
        .with_config(config.service_config()))
}

/// Read a JSON document from disk.
pub(crate) fn read_json(path: &Path) -> CliResult<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Command(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a snapshot document from disk.
pub(crate) fn read_snapshot(path: &Path) -> CliResult<Snapshot> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Command(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(Snapshot::from_json_str(&content)?)
}
