//! `strata snapshot` command - Print the current schema.

use std::path::Path;

use crate::cli::SnapshotArgs;
use crate::error::CliResult;
use crate::output;

/// Run the snapshot command
pub async fn run(config_path: &Path, args: SnapshotArgs) -> CliResult<()> {
    let service = super::service(config_path)?;

    if args.hash {
        let snapshot = service.snapshot_with_hash().await?;
        output::document(&snapshot, args.output.as_deref())
    } else {
        let snapshot = service.snapshot().await?;
        output::document(&snapshot, args.output.as_deref())
    }
}
