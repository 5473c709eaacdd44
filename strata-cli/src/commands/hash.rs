//! `strata hash` command - Print the versioned hash of a snapshot file.

use strata_schema::versioned_hash;

use crate::cli::HashArgs;
use crate::error::CliResult;

/// Run the hash command.
///
/// The snapshot is normalized first, so the result matches the hash the
/// service reports for the same schema.
pub async fn run(args: HashArgs) -> CliResult<()> {
    let snapshot = super::read_snapshot(&args.snapshot)?.normalized();
    println!("{}", versioned_hash(&snapshot));
    Ok(())
}
