//! Snapshot diffing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_schema::{Collection, CollectionKey, Field, FieldKey, Relation, SchemaEntity, Snapshot};

use crate::change::{EntityDiff, Operation};
use crate::deep::deep_diff;
use crate::error::{MigrateResult, MigrationError};
use crate::payload;

/// Identity of a collection inside a diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Collection name.
    pub collection: String,
}

/// Identity of a field inside a diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Owning collection.
    pub collection: String,
    /// Field name.
    pub field: String,
}

/// Identity of a relation inside a diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef {
    /// Collection holding the foreign key.
    pub collection: String,
    /// Field holding the foreign key.
    pub field: String,
    /// Target collection.
    #[serde(default)]
    pub related_collection: Option<String>,
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.field)
    }
}

impl fmt::Display for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.field)?;
        if let Some(related) = &self.related_collection {
            write!(f, " -> {related}")?;
        }
        Ok(())
    }
}

/// Ties a diff identity to its entity kind and to its sequence in a
/// [`SnapshotDiff`].
pub trait EntityRef:
    Clone + fmt::Debug + fmt::Display + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// Entity kind this identity refers to.
    type Entity: SchemaEntity;

    /// The identity of an entity.
    fn for_entity(entity: &Self::Entity) -> Self;

    /// The snapshot lookup key.
    fn key(&self) -> <Self::Entity as SchemaEntity>::Key;

    /// Name of the owning collection.
    fn collection(&self) -> &str;

    /// The entries of this kind.
    fn entries(diff: &SnapshotDiff) -> &[DiffEntry<Self>];

    /// Mutable access to the entries of this kind.
    fn entries_mut(diff: &mut SnapshotDiff) -> &mut Vec<DiffEntry<Self>>;
}

impl EntityRef for CollectionRef {
    type Entity = Collection;

    fn for_entity(entity: &Collection) -> Self {
        Self {
            collection: entity.collection.clone(),
        }
    }

    fn key(&self) -> CollectionKey {
        CollectionKey::new(&self.collection)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn entries(diff: &SnapshotDiff) -> &[DiffEntry<Self>] {
        &diff.collections
    }

    fn entries_mut(diff: &mut SnapshotDiff) -> &mut Vec<DiffEntry<Self>> {
        &mut diff.collections
    }
}

impl EntityRef for FieldRef {
    type Entity = Field;

    fn for_entity(entity: &Field) -> Self {
        Self {
            collection: entity.collection.clone(),
            field: entity.field.clone(),
        }
    }

    fn key(&self) -> FieldKey {
        FieldKey::new(&self.collection, &self.field)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn entries(diff: &SnapshotDiff) -> &[DiffEntry<Self>] {
        &diff.fields
    }

    fn entries_mut(diff: &mut SnapshotDiff) -> &mut Vec<DiffEntry<Self>> {
        &mut diff.fields
    }
}

impl EntityRef for RelationRef {
    type Entity = Relation;

    fn for_entity(entity: &Relation) -> Self {
        Self {
            collection: entity.collection.clone(),
            field: entity.field.clone(),
            related_collection: entity.related_collection.clone(),
        }
    }

    fn key(&self) -> FieldKey {
        FieldKey::new(&self.collection, &self.field)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn entries(diff: &SnapshotDiff) -> &[DiffEntry<Self>] {
        &diff.relations
    }

    fn entries_mut(diff: &mut SnapshotDiff) -> &mut Vec<DiffEntry<Self>> {
        &mut diff.relations
    }
}

/// One entity's identity paired with its change records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry<R> {
    /// Entity identity.
    #[serde(flatten)]
    pub target: R,
    /// Change records.
    pub diff: EntityDiff,
}

impl<R> DiffEntry<R> {
    /// Pair an identity with its changes.
    pub fn new(target: R, diff: EntityDiff) -> Self {
        Self { target, diff }
    }

    /// Classification of the entry.
    pub fn operation(&self) -> Operation {
        self.diff.operation()
    }
}

/// Counts of entries per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Entries creating an entity.
    pub create: usize,
    /// Entries updating an entity.
    pub update: usize,
    /// Entries deleting an entity.
    pub delete: usize,
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.create + self.update + self.delete == 0 {
            return f.write_str("No changes");
        }
        let mut parts = Vec::new();
        if self.create > 0 {
            parts.push(format!("Create {}", self.create));
        }
        if self.update > 0 {
            parts.push(format!("Update {}", self.update));
        }
        if self.delete > 0 {
            parts.push(format!("Delete {}", self.delete));
        }
        f.write_str(&parts.join(", "))
    }
}

/// The structural delta between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Collection entries.
    #[serde(default)]
    pub collections: Vec<DiffEntry<CollectionRef>>,
    /// Field entries.
    #[serde(default)]
    pub fields: Vec<DiffEntry<FieldRef>>,
    /// Relation entries.
    #[serde(default)]
    pub relations: Vec<DiffEntry<RelationRef>>,
}

impl SnapshotDiff {
    /// Check if there are any differences.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.fields.is_empty() && self.relations.is_empty()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.collections.len() + self.fields.len() + self.relations.len()
    }

    /// Count entries per operation.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        let operations = self
            .collections
            .iter()
            .map(DiffEntry::operation)
            .chain(self.fields.iter().map(DiffEntry::operation))
            .chain(self.relations.iter().map(DiffEntry::operation));
        for operation in operations {
            match operation {
                Operation::Create => summary.create += 1,
                Operation::Update => summary.update += 1,
                Operation::Delete => summary.delete += 1,
            }
        }
        summary
    }

    /// Validate the structure of a raw patch payload and parse it.
    pub fn from_json(value: &Value) -> MigrateResult<Self> {
        payload::validate_diff(value, "diff")?;
        serde_json::from_value(value.clone()).map_err(|err| MigrationError::invalid_payload(err.to_string()))
    }
}

/// A diff together with the hash of the snapshot it was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiffWithHash {
    /// Baseline hash.
    pub hash: String,
    /// The diff.
    pub diff: SnapshotDiff,
}

impl SnapshotDiffWithHash {
    /// Pair a diff with its baseline hash.
    pub fn new(hash: impl Into<String>, diff: SnapshotDiff) -> Self {
        Self {
            hash: hash.into(),
            diff,
        }
    }

    /// Validate the structure of a raw diff payload and parse it.
    pub fn from_json(value: &Value) -> MigrateResult<Self> {
        payload::validate_diff_with_hash(value)?;
        serde_json::from_value(value.clone()).map_err(|err| MigrationError::invalid_payload(err.to_string()))
    }
}

/// Which snapshot plays the role of the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffDirection {
    /// Changes turning the source into the target.
    #[default]
    Forward,
    /// Changes turning the target into the source.
    Reverse,
}

/// Builder-style differ over two snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotDiffer<'a> {
    /// Source snapshot (current state).
    source: Option<&'a Snapshot>,
    /// Target snapshot (desired state).
    target: &'a Snapshot,
    direction: DiffDirection,
}

impl<'a> SnapshotDiffer<'a> {
    /// Create a differ with only the target snapshot. A missing source is
    /// treated as an empty schema.
    pub fn new(target: &'a Snapshot) -> Self {
        Self {
            source: None,
            target,
            direction: DiffDirection::Forward,
        }
    }

    /// Set the source snapshot.
    pub fn with_source(mut self, source: &'a Snapshot) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: DiffDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Compute the diff.
    pub fn diff(&self) -> SnapshotDiff {
        let empty;
        let source = match self.source {
            Some(source) => source,
            None => {
                empty = Snapshot::new(&self.target.platform);
                &empty
            }
        };
        match self.direction {
            DiffDirection::Forward => compute_diff(source, self.target),
            DiffDirection::Reverse => compute_diff(self.target, source),
        }
    }
}

/// Compute the diff turning `before` into `after`.
///
/// For every kind, entries that edit or delete come first in `before`
/// order, followed by creations in `after` order, then the sequence is
/// stable-sorted by collection name. Field and relation entries of a
/// collection that is itself deleted are dropped, since deleting the
/// collection removes them.
pub fn compute_diff(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff {
        collections: diff_entities::<CollectionRef>(before, after),
        fields: diff_entities::<FieldRef>(before, after),
        relations: diff_entities::<RelationRef>(before, after),
    };

    let deleted: HashSet<String> = diff
        .collections
        .iter()
        .filter(|entry| entry.diff.is_delete())
        .map(|entry| entry.target.collection.clone())
        .collect();
    if !deleted.is_empty() {
        diff.fields.retain(|entry| !deleted.contains(&entry.target.collection));
        diff.relations.retain(|entry| !deleted.contains(&entry.target.collection));
    }

    diff
}

fn diff_entities<R: EntityRef>(before: &Snapshot, after: &Snapshot) -> Vec<DiffEntry<R>> {
    let old_items = <R::Entity as SchemaEntity>::of(before);
    let new_items = <R::Entity as SchemaEntity>::of(after);

    let new_by_key: HashMap<_, &R::Entity> = new_items.iter().map(|e| (e.key(), e)).collect();
    let old_keys: HashSet<_> = old_items.iter().map(SchemaEntity::key).collect();

    let mut entries = Vec::new();

    for old in old_items {
        match new_by_key.get(&old.key()) {
            Some(new) => {
                let changes = deep_diff(&old.to_document(), &new.to_document());
                if let Some(diff) = EntityDiff::from_changes(changes) {
                    entries.push(DiffEntry::new(R::for_entity(new), diff));
                }
            }
            None => entries.push(DiffEntry::new(
                R::for_entity(old),
                EntityDiff::delete(old.to_document()),
            )),
        }
    }

    for new in new_items {
        if !old_keys.contains(&new.key()) {
            entries.push(DiffEntry::new(
                R::for_entity(new),
                EntityDiff::create(new.to_document()),
            ));
        }
    }

    entries.sort_by(|a, b| a.target.collection().cmp(b.target.collection()));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Change, DiffKind, PathSegment};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> Snapshot {
        Snapshot::new("1.0.0")
            .with_collection(Collection::new("articles").with_meta(json!({ "icon": "article" })))
            .with_collection(Collection::new("users"))
            .with_field(Field::new("articles", "title", "string"))
            .with_field(Field::new("users", "name", "string"))
            .with_relation(Relation::new("articles", "author").related_to("users"))
    }

    #[test]
    fn test_self_diff_is_empty() {
        let diff = compute_diff(&base(), &base());
        assert!(diff.is_empty());
        assert_eq!(diff.summary().to_string(), "No changes");
    }

    #[test]
    fn test_new_collection() {
        let after = base().with_collection(Collection::new("orders"));
        let diff = compute_diff(&base(), &after);

        assert_eq!(diff.collections.len(), 1);
        let entry = &diff.collections[0];
        assert_eq!(entry.target.collection, "orders");
        assert_eq!(entry.operation(), Operation::Create);
        assert_eq!(entry.diff.created_document().unwrap()["collection"], "orders");
        assert!(diff.fields.is_empty());
        assert!(diff.relations.is_empty());
    }

    #[test]
    fn test_edit_lists_leaf_paths() {
        let mut after = base();
        after.collections[0].meta = Some(json!({ "icon": "feed", "note": "x" }));
        let diff = compute_diff(&base(), &after);

        let entry = &diff.collections[0];
        assert_eq!(entry.operation(), Operation::Update);
        assert_eq!(
            entry.diff.changes(),
            &[
                Change::edited(
                    vec![PathSegment::from("meta"), PathSegment::from("icon")],
                    json!("article"),
                    json!("feed"),
                ),
                Change::New {
                    path: vec![PathSegment::from("meta"), PathSegment::from("note")],
                    rhs: json!("x"),
                },
            ]
        );
    }

    #[test]
    fn test_deleted_collection_absorbs_its_fields_and_relations() {
        let mut after = base();
        after.collections.retain(|c| c.collection != "articles");
        after.fields.retain(|f| f.collection != "articles");
        after.relations.clear();

        let diff = compute_diff(&base(), &after);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.collections[0].operation(), Operation::Delete);
        assert!(diff.fields.is_empty());
        assert!(diff.relations.is_empty());
    }

    #[test]
    fn test_entries_sorted_by_collection() {
        let after = base()
            .with_field(Field::new("users", "email", "string"))
            .with_field(Field::new("articles", "body", "text"));
        let diff = compute_diff(&base(), &after);

        let names: Vec<_> = diff.fields.iter().map(|e| e.target.to_string()).collect();
        assert_eq!(names, vec!["articles.body", "users.email"]);
    }

    #[test]
    fn test_reverse_direction_swaps_roles() {
        let target = base().with_collection(Collection::new("orders"));
        let current = base();

        let forward = SnapshotDiffer::new(&target).with_source(&current).diff();
        let reverse = SnapshotDiffer::new(&target)
            .with_source(&current)
            .with_direction(DiffDirection::Reverse)
            .diff();

        assert_eq!(forward.collections[0].diff.kind(), DiffKind::New);
        assert_eq!(reverse.collections[0].diff.kind(), DiffKind::Delete);
    }

    #[test]
    fn test_missing_source_creates_everything() {
        let diff = SnapshotDiffer::new(&base()).diff();
        assert_eq!(diff.summary(), DiffSummary { create: 5, update: 0, delete: 0 });
        assert_eq!(diff.summary().to_string(), "Create 5");
    }

    #[test]
    fn test_wire_format() {
        let after = base().with_relation(Relation::new("users", "avatar").related_to("files"));
        let diff = compute_diff(&base(), &after);
        let wire = serde_json::to_value(&diff).unwrap();

        assert_eq!(wire["relations"][0]["collection"], "users");
        assert_eq!(wire["relations"][0]["related_collection"], "files");
        assert_eq!(wire["relations"][0]["diff"][0]["kind"], "N");
        assert_eq!(wire["relations"][0]["diff"][0]["rhs"]["field"], "avatar");

        let back: SnapshotDiff = serde_json::from_value(wire).unwrap();
        assert_eq!(back, diff);
    }

    #[test]
    fn test_relation_ref_display() {
        let relation = RelationRef {
            collection: "articles".into(),
            field: "author".into(),
            related_collection: Some("users".into()),
        };
        assert_eq!(relation.to_string(), "articles.author -> users");
    }
}
