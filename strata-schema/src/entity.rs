//! Schema entities and their identity keys.
//!
//! A snapshot holds three kinds of entity. Each kind is identified by a key
//! that is unique within one snapshot:
//!
//! | Kind       | Key                     |
//! |------------|-------------------------|
//! | collection | `collection`            |
//! | field      | `(collection, field)`   |
//! | relation   | `(collection, field)`   |
//!
//! [`SchemaEntity`] lets the diff, validation and apply passes treat all three
//! kinds uniformly.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::snapshot::Snapshot;

/// The kind of a schema entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A collection (table).
    Collection,
    /// A field (column) of a collection.
    Field,
    /// A relation originating from a field.
    Relation,
}

impl EntityKind {
    /// Lowercase name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Field => "field",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    /// Collection name.
    pub collection: String,
}

impl CollectionKey {
    /// Create a new collection key.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)
    }
}

/// Identity of a field or of the relation attached to it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    /// Owning collection.
    pub collection: String,
    /// Field name.
    pub field: String,
}

impl FieldKey {
    /// Create a new field key.
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.field)
    }
}

/// Common behaviour of collections, fields and relations.
pub trait SchemaEntity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Identity key type.
    type Key: Clone + fmt::Debug + fmt::Display + Eq + Ord + Hash + Send + Sync;

    /// Kind of this entity.
    const KIND: EntityKind;

    /// Build the identity key.
    fn key(&self) -> Self::Key;

    /// Check the identity without allocating a key.
    fn matches(&self, key: &Self::Key) -> bool;

    /// Name of the owning collection.
    fn collection(&self) -> &str;

    /// JSON document compared by the diff engine.
    fn to_document(&self) -> Value;

    /// The sequence of this kind inside a snapshot.
    fn of(snapshot: &Snapshot) -> &[Self];

    /// Mutable access to the sequence of this kind inside a snapshot.
    fn of_mut(snapshot: &mut Snapshot) -> &mut Vec<Self>;
}

/// A collection descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name.
    pub collection: String,
    /// Platform metadata (display options, sort field, ...).
    #[serde(default)]
    pub meta: Option<Value>,
    /// Physical schema details reported by the database.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl Collection {
    /// Create a collection without metadata.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            meta: None,
            schema: None,
        }
    }

    /// Set the metadata. `null` clears it.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = present(meta);
        self
    }

    /// Set the physical schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = present(schema);
        self
    }
}

impl SchemaEntity for Collection {
    type Key = CollectionKey;

    const KIND: EntityKind = EntityKind::Collection;

    fn key(&self) -> CollectionKey {
        CollectionKey::new(&self.collection)
    }

    fn matches(&self, key: &CollectionKey) -> bool {
        self.collection == key.collection
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn to_document(&self) -> Value {
        json!({
            "collection": self.collection,
            "meta": self.meta,
            "schema": self.schema,
        })
    }

    fn of(snapshot: &Snapshot) -> &[Self] {
        &snapshot.collections
    }

    fn of_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.collections
    }
}

/// A field descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Owning collection.
    pub collection: String,
    /// Field name.
    pub field: String,
    /// Platform type (`string`, `integer`, `alias`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Platform metadata (interface, options, ...).
    #[serde(default)]
    pub meta: Option<Value>,
    /// Column details reported by the database.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl Field {
    /// Create a field without metadata.
    pub fn new(
        collection: impl Into<String>,
        field: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            field_type: field_type.into(),
            meta: None,
            schema: None,
        }
    }

    /// Set the metadata. `null` clears it.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = present(meta);
        self
    }

    /// Set the column schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = present(schema);
        self
    }
}

impl SchemaEntity for Field {
    type Key = FieldKey;

    const KIND: EntityKind = EntityKind::Field;

    fn key(&self) -> FieldKey {
        FieldKey::new(&self.collection, &self.field)
    }

    fn matches(&self, key: &FieldKey) -> bool {
        self.collection == key.collection && self.field == key.field
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn to_document(&self) -> Value {
        json!({
            "collection": self.collection,
            "field": self.field,
            "type": self.field_type,
            "meta": self.meta,
            "schema": self.schema,
        })
    }

    fn of(snapshot: &Snapshot) -> &[Self] {
        &snapshot.fields
    }

    fn of_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.fields
    }
}

/// A relation descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Collection holding the foreign key.
    pub collection: String,
    /// Field holding the foreign key.
    pub field: String,
    /// Target collection, absent for polymorphic relations.
    #[serde(default)]
    pub related_collection: Option<String>,
    /// Platform metadata (junction field, sort field, ...).
    #[serde(default)]
    pub meta: Option<Value>,
    /// Constraint details reported by the database.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl Relation {
    /// Create a relation without metadata.
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            related_collection: None,
            meta: None,
            schema: None,
        }
    }

    /// Set the target collection.
    pub fn related_to(mut self, collection: impl Into<String>) -> Self {
        self.related_collection = Some(collection.into());
        self
    }

    /// Set the metadata. `null` clears it.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = present(meta);
        self
    }

    /// Set the constraint schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = present(schema);
        self
    }
}

impl SchemaEntity for Relation {
    type Key = FieldKey;

    const KIND: EntityKind = EntityKind::Relation;

    fn key(&self) -> FieldKey {
        FieldKey::new(&self.collection, &self.field)
    }

    fn matches(&self, key: &FieldKey) -> bool {
        self.collection == key.collection && self.field == key.field
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn to_document(&self) -> Value {
        json!({
            "collection": self.collection,
            "field": self.field,
            "related_collection": self.related_collection,
            "meta": self.meta,
            "schema": self.schema,
        })
    }

    fn of(snapshot: &Snapshot) -> &[Self] {
        &snapshot.relations
    }

    fn of_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.relations
    }
}

/// `null` decodes as an absent attribute, so it is stored as one.
fn present(value: Value) -> Option<Value> {
    Some(value).filter(|value| !value.is_null())
}
