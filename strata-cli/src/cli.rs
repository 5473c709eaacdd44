//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use strata_schema::DatabaseVendor;

use crate::config::CONFIG_FILE_NAME;

/// Strata CLI - schema snapshots, diffs and migrations
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Strata CLI - schema snapshots, diffs and migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "STRATA_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new Strata project
    Init(InitArgs),

    /// Print the current schema snapshot
    Snapshot(SnapshotArgs),

    /// Compute the diff turning the current schema into a target snapshot
    Diff(DiffArgs),

    /// Compute the patch turning a snapshot into the current schema
    Patch(DiffArgs),

    /// Apply a hash-guarded diff to the current schema
    Apply(ApplyArgs),

    /// Apply an additive patch to the current schema
    ApplyPatch(ApplyArgs),

    /// Print the versioned hash of a snapshot file
    Hash(HashArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Init Command
// =============================================================================

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize the project (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Platform version recorded in snapshots
    #[arg(long)]
    pub platform: Option<String>,

    /// Database vendor of the instance
    #[arg(long)]
    pub vendor: Option<VendorArg>,

    /// Overwrite an existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Database vendors accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VendorArg {
    Postgres,
    Mysql,
    Sqlite,
    Mssql,
    Oracle,
    Cockroachdb,
    Redshift,
}

impl From<VendorArg> for DatabaseVendor {
    fn from(vendor: VendorArg) -> Self {
        match vendor {
            VendorArg::Postgres => DatabaseVendor::Postgres,
            VendorArg::Mysql => DatabaseVendor::Mysql,
            VendorArg::Sqlite => DatabaseVendor::Sqlite,
            VendorArg::Mssql => DatabaseVendor::Mssql,
            VendorArg::Oracle => DatabaseVendor::Oracle,
            VendorArg::Cockroachdb => DatabaseVendor::Cockroachdb,
            VendorArg::Redshift => DatabaseVendor::Redshift,
        }
    }
}

// =============================================================================
// Snapshot Command
// =============================================================================

/// Arguments for the `snapshot` command
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Include the versioned hash
    #[arg(long)]
    pub hash: bool,

    /// Write the snapshot to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// =============================================================================
// Diff / Patch Commands
// =============================================================================

/// Arguments for the `diff` and `patch` commands
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Snapshot file to compare against the current schema
    pub snapshot: PathBuf,

    /// Accept snapshots from another platform version or vendor
    #[arg(short, long)]
    pub force: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// =============================================================================
// Apply Commands
// =============================================================================

/// Arguments for the `apply` and `apply-patch` commands
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Payload file produced by `strata diff` or `strata patch`
    pub payload: PathBuf,
}

// =============================================================================
// Hash Command
// =============================================================================

/// Arguments for the `hash` command
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Snapshot file to hash
    pub snapshot: PathBuf,
}
