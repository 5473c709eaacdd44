//! `strata apply` and `strata apply-patch` commands.

use std::path::Path;

use strata_migrate::ApplyOutcome;

use crate::cli::ApplyArgs;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the apply command
pub async fn run(config_path: &Path, args: ApplyArgs) -> CliResult<()> {
    let service = super::service(config_path)?;
    let payload = super::read_json(&args.payload)?;

    match service.apply_json(&payload).await? {
        ApplyOutcome::Applied => success("Schema diff applied"),
        ApplyOutcome::NothingToApply => output::info("Nothing to apply"),
    }
    Ok(())
}

/// Run the apply-patch command
pub async fn run_patch(config_path: &Path, args: ApplyArgs) -> CliResult<()> {
    let service = super::service(config_path)?;
    let patch = super::read_json(&args.payload)?;

    let applied = service.apply_patch_json(&patch).await?;
    success(&format!("Schema patch applied ({})", applied.summary()));
    Ok(())
}
