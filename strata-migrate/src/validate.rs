//! Precondition checks for applying a full diff.

use strata_schema::{SchemaEntity, Snapshot, SnapshotWithHash};
use tracing::{debug, warn};

use crate::change::Operation;
use crate::diff::{CollectionRef, EntityRef, FieldRef, RelationRef, SnapshotDiffWithHash};
use crate::error::{MigrateResult, MigrationError};

/// Decide whether a diff may be applied to the current schema.
///
/// Returns `Ok(false)` when the diff is empty and `Ok(true)` when it was
/// computed against exactly the current state. On a hash mismatch every
/// create and delete is re-checked against `current` so the caller gets the
/// most specific conflict. When none conflicts, the baseline is stale and
/// the diff is rejected anyway.
pub fn validate_apply_diff(
    payload: &SnapshotDiffWithHash,
    current: &SnapshotWithHash,
) -> MigrateResult<bool> {
    if payload.diff.is_empty() {
        debug!("diff is empty, nothing to apply");
        return Ok(false);
    }

    if payload.hash == current.hash {
        return Ok(true);
    }

    check_preconditions::<CollectionRef>(payload, current)?;
    check_preconditions::<FieldRef>(payload, current)?;
    check_preconditions::<RelationRef>(payload, current)?;

    warn!(
        baseline = %payload.hash,
        current = %current.hash,
        "diff baseline is stale"
    );
    Err(MigrationError::invalid_payload(STALE_HASH_REASON))
}

/// Reason reported when a diff's baseline is no longer the live schema.
pub(crate) const STALE_HASH_REASON: &str = "Provided hash does not match the current instance's \
    schema hash, indicating the schema has changed after this diff was generated. Please generate \
    a new diff and try again";

fn check_preconditions<R: EntityRef>(
    payload: &SnapshotDiffWithHash,
    current: &Snapshot,
) -> MigrateResult<()> {
    let kind = <R::Entity as SchemaEntity>::KIND;
    for entry in R::entries(&payload.diff) {
        let exists = current.contains::<R::Entity>(&entry.target.key());
        match entry.operation() {
            Operation::Create if exists => {
                return Err(MigrationError::invalid_payload(format!(
                    "Provided diff is trying to create {kind} \"{}\" but it already exists. \
                     Please generate a new diff and try again",
                    entry.target
                )));
            }
            Operation::Delete if !exists => {
                return Err(MigrationError::invalid_payload(format!(
                    "Provided diff is trying to delete {kind} \"{}\" but it does not exist. \
                     Please generate a new diff and try again",
                    entry.target
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
