//! `strata diff` and `strata patch` commands.

use std::path::Path;

use strata_migrate::{DiffOptions, SnapshotDiffWithHash};

use crate::cli::DiffArgs;
use crate::error::CliResult;
use crate::output;

/// Run the diff command.
///
/// The emitted payload carries the hash of the schema the diff was computed
/// against, ready for `strata apply`.
pub async fn run(config_path: &Path, args: DiffArgs) -> CliResult<()> {
    let service = super::service(config_path)?;
    let target = super::read_snapshot(&args.snapshot)?;

    let current = service.snapshot_with_hash().await?;
    let hash = current.hash.clone();
    let options = DiffOptions::new()
        .current_snapshot(current.into_snapshot())
        .force(args.force);

    match service.diff(&target, options).await? {
        Some(diff) => output::document(&SnapshotDiffWithHash::new(hash, diff), args.output.as_deref()),
        None => {
            output::info("No changes");
            Ok(())
        }
    }
}

/// Run the patch command
pub async fn run_patch(config_path: &Path, args: DiffArgs) -> CliResult<()> {
    let service = super::service(config_path)?;
    let target = super::read_snapshot(&args.snapshot)?;

    match service.patch(&target, DiffOptions::new().force(args.force)).await? {
        Some(patch) => output::document(&patch, args.output.as_deref()),
        None => {
            output::info("No changes");
            Ok(())
        }
    }
}
