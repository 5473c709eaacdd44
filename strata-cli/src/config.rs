//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use strata_migrate::{Accountability, SchemaServiceConfig};
use strata_schema::{DatabaseVendor, InstanceInfo};

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Default live schema file (relative to the config file)
pub const SCHEMA_FILE_NAME: &str = "schema.json";

/// Strata CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of the instance
    pub instance: InstanceConfig,

    /// Live schema storage
    pub store: StoreConfig,

    /// Caller identity
    pub accountability: AccountabilityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "{} not found. Run `strata init` first",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the live schema file. Relative paths are resolved against the
    /// directory holding the config file.
    pub fn store_path(&self, config_path: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            return self.store.path.clone();
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.store.path)
    }

    /// Schema service configuration
    pub fn service_config(&self) -> SchemaServiceConfig {
        SchemaServiceConfig::new().instance(self.instance.info())
    }
}

/// Instance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Platform version recorded in snapshots
    pub platform: String,

    /// Database vendor
    pub vendor: Option<DatabaseVendor>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            platform: env!("CARGO_PKG_VERSION").to_string(),
            vendor: None,
        }
    }
}

impl InstanceConfig {
    /// Instance identity used for snapshot validation
    pub fn info(&self) -> InstanceInfo {
        InstanceInfo {
            platform: self.platform.clone(),
            vendor: self.vendor,
        }
    }
}

/// Live schema storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the live schema
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(SCHEMA_FILE_NAME),
        }
    }
}

/// Caller identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountabilityConfig {
    /// Whether the CLI operates with admin privilege
    pub admin: bool,

    /// User recorded in logs
    pub user: Option<String>,

    /// Role recorded in logs
    pub role: Option<String>,
}

impl AccountabilityConfig {
    /// Caller passed to the schema service
    pub fn accountability(&self) -> Accountability {
        let accountability = Accountability {
            user: self.user.clone(),
            admin: self.admin,
            ..Accountability::default()
        };
        match &self.role {
            Some(role) => accountability.with_role(role.clone()),
            None => accountability,
        }
    }
}

/// Logging configuration, overridden by `STRATA_*` environment variables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Output format (json, pretty, compact)
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[accountability]\nadmin = true\n").unwrap();
        assert!(config.accountability.admin);
        assert_eq!(config.store.path, PathBuf::from(SCHEMA_FILE_NAME));
        assert_eq!(config.instance.platform, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.logging.level, None);
    }

    #[test]
    fn test_vendor_parses_lowercase() {
        let config: Config = toml::from_str("[instance]\nplatform = \"2.0.0\"\nvendor = \"sqlite\"\n").unwrap();
        let info = config.instance.info();
        assert_eq!(info.platform, "2.0.0");
        assert_eq!(info.vendor, Some(DatabaseVendor::Sqlite));
    }

    #[test]
    fn test_store_path_is_relative_to_config() {
        let config = Config::default();
        assert_eq!(
            config.store_path(Path::new("/srv/app/strata.toml")),
            PathBuf::from("/srv/app/schema.json")
        );
    }

    #[test]
    fn test_not_admin_by_default() {
        assert!(!Config::default().accountability.accountability().admin);
    }

    #[test]
    fn test_role_reaches_accountability() {
        let config: Config =
            toml::from_str("[accountability]\nuser = \"alice\"\nrole = \"editor\"\n").unwrap();
        let accountability = config.accountability.accountability();
        assert_eq!(accountability.user.as_deref(), Some("alice"));
        assert_eq!(accountability.role.as_deref(), Some("editor"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load(Path::new("/nonexistent/strata.toml")).unwrap_err();
        assert!(err.to_string().contains("strata init"));
    }
}
