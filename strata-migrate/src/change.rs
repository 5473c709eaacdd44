//! Elementary change records and per-entity diffs.
//!
//! On the wire a change record is the flat object
//! `{kind, path?, lhs?, rhs?, index?, item?}` and an entity diff is an array
//! of such records. Internally a record is the [`Change`] sum type and an
//! entity diff is an [`EntityDiff`] whose [`Operation`] is computed once, when
//! it is built, from its first record.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind code of a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// A value that did not exist before.
    #[serde(rename = "N")]
    New,
    /// A value that changed in place.
    #[serde(rename = "E")]
    Edit,
    /// A value that was removed.
    #[serde(rename = "D")]
    Delete,
    /// An element change inside an array.
    #[serde(rename = "A")]
    Array,
}

impl DiffKind {
    /// All kinds, in wire-documentation order.
    pub const ALL: [DiffKind; 4] = [Self::New, Self::Edit, Self::Delete, Self::Array];

    /// Single-letter wire code.
    pub fn code(self) -> &'static str {
        match self {
            Self::New => "N",
            Self::Edit => "E",
            Self::Delete => "D",
            Self::Array => "A",
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

/// Render a path as `a.b.0.c`.
pub fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// An elementary change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChangeRecord", into = "ChangeRecord")]
pub enum Change {
    /// A value appeared at `path`.
    New {
        /// Property path, empty for the entity itself.
        path: Vec<PathSegment>,
        /// The new value.
        rhs: Value,
    },
    /// The value at `path` changed.
    Edit {
        /// Property path.
        path: Vec<PathSegment>,
        /// Previous value.
        lhs: Value,
        /// New value.
        rhs: Value,
    },
    /// The value at `path` was removed.
    Delete {
        /// Property path, empty for the entity itself.
        path: Vec<PathSegment>,
        /// Removed value.
        lhs: Value,
    },
    /// Element `index` of the array at `path` changed.
    Array {
        /// Path of the array.
        path: Vec<PathSegment>,
        /// Element index.
        index: usize,
        /// What happened to the element.
        item: Box<Change>,
    },
}

impl Change {
    /// Shorthand for a root-level creation record.
    pub fn created(document: Value) -> Self {
        Self::New {
            path: Vec::new(),
            rhs: document,
        }
    }

    /// Shorthand for a root-level deletion record.
    pub fn deleted(document: Value) -> Self {
        Self::Delete {
            path: Vec::new(),
            lhs: document,
        }
    }

    /// Shorthand for an in-place edit.
    pub fn edited(path: Vec<PathSegment>, lhs: Value, rhs: Value) -> Self {
        Self::Edit { path, lhs, rhs }
    }

    /// Kind code of this record.
    pub fn kind(&self) -> DiffKind {
        match self {
            Self::New { .. } => DiffKind::New,
            Self::Edit { .. } => DiffKind::Edit,
            Self::Delete { .. } => DiffKind::Delete,
            Self::Array { .. } => DiffKind::Array,
        }
    }

    /// Property path of this record.
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Self::New { path, .. }
            | Self::Edit { path, .. }
            | Self::Delete { path, .. }
            | Self::Array { path, .. } => path,
        }
    }
}

/// Flat wire representation of a [`Change`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChangeRecord {
    kind: DiffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Vec<PathSegment>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    lhs: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    rhs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item: Option<Box<Change>>,
}

/// Keep an explicit `null` distinct from an absent attribute.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<ChangeRecord> for Change {
    type Error = String;

    fn try_from(record: ChangeRecord) -> Result<Self, Self::Error> {
        let path = record.path.unwrap_or_default();
        match record.kind {
            DiffKind::New => Ok(Self::New {
                path,
                rhs: record.rhs.ok_or("\"rhs\" is required")?,
            }),
            DiffKind::Edit => Ok(Self::Edit {
                path,
                lhs: record.lhs.ok_or("\"lhs\" is required")?,
                rhs: record.rhs.ok_or("\"rhs\" is required")?,
            }),
            DiffKind::Delete => Ok(Self::Delete {
                path,
                lhs: record.lhs.ok_or("\"lhs\" is required")?,
            }),
            DiffKind::Array => Ok(Self::Array {
                path,
                index: record.index.ok_or("\"index\" is required")?,
                item: record.item.ok_or("\"item\" is required")?,
            }),
        }
    }
}

impl From<Change> for ChangeRecord {
    fn from(change: Change) -> Self {
        let kind = change.kind();
        let (path, lhs, rhs, index, item) = match change {
            Change::New { path, rhs } => (path, None, Some(rhs), None, None),
            Change::Edit { path, lhs, rhs } => (path, Some(lhs), Some(rhs), None, None),
            Change::Delete { path, lhs } => (path, Some(lhs), None, None, None),
            Change::Array { path, index, item } => (path, None, None, Some(index), Some(item)),
        };
        Self {
            kind,
            path: (!path.is_empty()).then_some(path),
            lhs,
            rhs,
            index,
            item,
        }
    }
}

/// What an entity diff does to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The entity did not exist before.
    Create,
    /// The entity is modified in place.
    Update,
    /// The entity is removed.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// The non-empty list of change records for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Change>", into = "Vec<Change>")]
pub struct EntityDiff {
    operation: Operation,
    changes: Vec<Change>,
}

impl EntityDiff {
    /// Build from records, classifying by the first one. Returns `None` when
    /// there are no records.
    ///
    /// A root-level `N` record classifies as [`Operation::Create`], a
    /// root-level `D` record as [`Operation::Delete`], anything else as
    /// [`Operation::Update`].
    pub fn from_changes(changes: Vec<Change>) -> Option<Self> {
        let operation = match changes.first()? {
            Change::New { path, .. } if path.is_empty() => Operation::Create,
            Change::Delete { path, .. } if path.is_empty() => Operation::Delete,
            _ => Operation::Update,
        };
        Some(Self { operation, changes })
    }

    /// A diff creating the entity described by `document`.
    pub fn create(document: Value) -> Self {
        Self {
            operation: Operation::Create,
            changes: vec![Change::created(document)],
        }
    }

    /// A diff deleting the entity described by `document`.
    pub fn delete(document: Value) -> Self {
        Self {
            operation: Operation::Delete,
            changes: vec![Change::deleted(document)],
        }
    }

    /// The classification of this diff.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Kind code of the first record.
    pub fn kind(&self) -> DiffKind {
        self.changes[0].kind()
    }

    /// The change records.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The proposed document of a creation.
    pub fn created_document(&self) -> Option<&Value> {
        match (self.operation, &self.changes[0]) {
            (Operation::Create, Change::New { rhs, .. }) => Some(rhs),
            _ => None,
        }
    }

    /// Check if this diff creates its entity.
    pub fn is_create(&self) -> bool {
        self.operation == Operation::Create
    }

    /// Check if this diff deletes its entity.
    pub fn is_delete(&self) -> bool {
        self.operation == Operation::Delete
    }
}

impl TryFrom<Vec<Change>> for EntityDiff {
    type Error = &'static str;

    fn try_from(changes: Vec<Change>) -> Result<Self, Self::Error> {
        Self::from_changes(changes).ok_or("an entity diff needs at least one change record")
    }
}

impl From<EntityDiff> for Vec<Change> {
    fn from(diff: EntityDiff) -> Self {
        diff.changes
    }
}
