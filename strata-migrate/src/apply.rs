//! Faithful in-memory application of a diff to a snapshot.

use serde_json::Value;
use strata_schema::{EntityKind, SchemaEntity, Snapshot};

use crate::change::Operation;
use crate::deep::apply_changes;
use crate::diff::{CollectionRef, EntityRef, FieldRef, RelationRef, SnapshotDiff};
use crate::error::ApplyError;

/// Apply `diff` to `baseline`, returning the resulting snapshot.
///
/// Collections are applied first, then fields, then relations. Deleting a
/// collection also removes its fields and relations. The result is
/// normalized. On failure nothing is returned and `baseline` is untouched.
///
/// An entry may not change the identity of its entity, so identity keys
/// stay unique.
pub fn apply_diff(baseline: &Snapshot, diff: &SnapshotDiff) -> Result<Snapshot, ApplyError> {
    let mut next = baseline.clone();
    apply_entries::<CollectionRef>(&mut next, diff)?;
    apply_entries::<FieldRef>(&mut next, diff)?;
    apply_entries::<RelationRef>(&mut next, diff)?;
    next.normalize();
    Ok(next)
}

fn apply_entries<R: EntityRef>(snapshot: &mut Snapshot, diff: &SnapshotDiff) -> Result<(), ApplyError> {
    let kind = <R::Entity as SchemaEntity>::KIND;

    for entry in R::entries(diff) {
        let key = entry.target.key();
        let position = <R::Entity as SchemaEntity>::of(snapshot).iter().position(|e| e.matches(&key));
        let patch_error = |source| ApplyError::Patch {
            kind,
            key: key.to_string(),
            source,
        };

        match (entry.operation(), position) {
            (Operation::Create, Some(_)) => {
                return Err(ApplyError::AlreadyExists {
                    kind,
                    key: key.to_string(),
                });
            }
            (Operation::Update | Operation::Delete, None) => {
                return Err(ApplyError::NotFound {
                    kind,
                    key: key.to_string(),
                });
            }
            (Operation::Create, None) => {
                let mut document = Value::Null;
                apply_changes(&mut document, entry.diff.changes()).map_err(patch_error)?;
                let entity = decode::<R::Entity>(document, &key)?;
                <R::Entity as SchemaEntity>::of_mut(snapshot).push(entity);
            }
            (Operation::Update, Some(position)) => {
                let mut document = <R::Entity as SchemaEntity>::of(snapshot)[position].to_document();
                apply_changes(&mut document, entry.diff.changes()).map_err(patch_error)?;
                <R::Entity as SchemaEntity>::of_mut(snapshot)[position] = decode::<R::Entity>(document, &key)?;
            }
            (Operation::Delete, Some(position)) => {
                <R::Entity as SchemaEntity>::of_mut(snapshot).remove(position);
                if kind == EntityKind::Collection {
                    let name = entry.target.collection();
                    snapshot.fields.retain(|field| field.collection != name);
                    snapshot.relations.retain(|relation| relation.collection != name);
                }
            }
        }
    }

    Ok(())
}

/// Deserialize `document` and require that it still names `key`.
fn decode<E: SchemaEntity>(document: Value, key: &E::Key) -> Result<E, ApplyError> {
    let entity: E = serde_json::from_value(document).map_err(|source| ApplyError::InvalidDocument {
        kind: E::KIND,
        key: key.to_string(),
        source,
    })?;
    if !entity.matches(key) {
        return Err(ApplyError::IdentityMismatch {
            kind: E::KIND,
            key: key.to_string(),
            found: entity.key().to_string(),
        });
    }
    Ok(entity)
}
