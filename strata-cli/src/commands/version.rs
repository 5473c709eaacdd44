//! `strata version` command - Display version information.

use strata_schema::SNAPSHOT_VERSION;

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::header("Strata");

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);
    kv("Snapshot format", &SNAPSHOT_VERSION.to_string());

    output::newline();

    output::section("Components");
    kv("strata-schema", env!("CARGO_PKG_VERSION"));
    kv("strata-migrate", env!("CARGO_PKG_VERSION"));

    output::newline();
    output::dim("Supported vendors: postgres, mysql, sqlite, mssql, oracle, cockroachdb, redshift");

    Ok(())
}
