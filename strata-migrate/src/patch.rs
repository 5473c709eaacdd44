//! Sanitizing of additive patches.
//!
//! A patch is a diff that never deletes. Before it is applied it is
//! reconciled against the current schema:
//!
//! - a create of an entity that already exists becomes an update carrying
//!   only the residual differences, or is dropped when there are none;
//! - an update of an entity that does not exist is dropped;
//! - anything else is dropped.

use strata_schema::{SchemaEntity, Snapshot};
use tracing::debug;

use crate::change::{DiffKind, EntityDiff, Operation};
use crate::deep::deep_diff;
use crate::diff::{CollectionRef, DiffEntry, EntityRef, FieldRef, RelationRef, SnapshotDiff};
use crate::error::{MigrateResult, MigrationError};

/// Reject destructive patches.
///
/// Returns `Ok(false)` for an empty patch and `Ok(true)` otherwise.
pub fn validate_apply_patch(patch: &SnapshotDiff) -> MigrateResult<bool> {
    reject_deletes::<CollectionRef>(patch)?;
    reject_deletes::<FieldRef>(patch)?;
    reject_deletes::<RelationRef>(patch)?;
    Ok(!patch.is_empty())
}

fn reject_deletes<R: EntityRef>(patch: &SnapshotDiff) -> MigrateResult<()> {
    match R::entries(patch).iter().find(|entry| entry.diff.kind() == DiffKind::Delete) {
        Some(entry) => Err(MigrationError::invalid_payload(format!(
            "Provided patch is trying to delete the {} \"{}\" but it's not authorized in patch. \
             Please generate a new patch and try again",
            <R::Entity as SchemaEntity>::KIND,
            entry.target
        ))),
        None => Ok(()),
    }
}

/// Reconcile a patch with the current schema.
///
/// Fails when nothing is left to apply.
pub fn clean_apply_patch(patch: SnapshotDiff, current: &Snapshot) -> MigrateResult<SnapshotDiff> {
    let cleaned = SnapshotDiff {
        collections: clean_entries(patch.collections, current),
        fields: clean_entries(patch.fields, current),
        relations: clean_entries(patch.relations, current),
    };

    if cleaned.is_empty() {
        return Err(MigrationError::invalid_payload(
            "All elements are already created. Nothing to do",
        ));
    }

    Ok(cleaned)
}

fn clean_entries<R: EntityRef>(entries: Vec<DiffEntry<R>>, current: &Snapshot) -> Vec<DiffEntry<R>> {
    let kind = <R::Entity as SchemaEntity>::KIND;
    entries
        .into_iter()
        .filter_map(|entry| {
            let existing = current.find::<R::Entity>(&entry.target.key());
            match (entry.operation(), existing) {
                (Operation::Create, None) | (Operation::Update, Some(_)) => Some(entry),
                (Operation::Create, Some(existing)) => {
                    let proposed = entry.diff.created_document()?;
                    let residual = deep_diff(&existing.to_document(), proposed);
                    match EntityDiff::from_changes(residual) {
                        Some(diff) => {
                            debug!(
                                %kind,
                                target = %entry.target,
                                changes = diff.changes().len(),
                                "create of existing entity reclassified as update"
                            );
                            Some(DiffEntry::new(entry.target, diff))
                        }
                        None => {
                            debug!(%kind, target = %entry.target, "dropping create of identical entity");
                            None
                        }
                    }
                }
                (Operation::Update, None) => {
                    debug!(%kind, target = %entry.target, "dropping update of missing entity");
                    None
                }
                (Operation::Delete, _) => {
                    debug!(%kind, target = %entry.target, "dropping delete from patch");
                    None
                }
            }
        })
        .collect()
}
