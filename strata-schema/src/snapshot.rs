//! Point-in-time snapshots of a logical schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::entity::{Collection, Field, Relation, SchemaEntity};
use crate::error::SnapshotResult;
use crate::hash::versioned_hash;

/// Snapshot format version produced by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Database vendors a snapshot can be taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseVendor {
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    Mysql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    Mssql,
    /// Oracle.
    Oracle,
    /// CockroachDB.
    Cockroachdb,
    /// Amazon Redshift.
    Redshift,
}

impl DatabaseVendor {
    /// Lowercase vendor name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Mssql => "mssql",
            Self::Oracle => "oracle",
            Self::Cockroachdb => "cockroachdb",
            Self::Redshift => "redshift",
        }
    }
}

impl fmt::Display for DatabaseVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatabaseVendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mssql" => Ok(Self::Mssql),
            "oracle" | "oracledb" => Ok(Self::Oracle),
            "cockroachdb" => Ok(Self::Cockroachdb),
            "redshift" => Ok(Self::Redshift),
            other => Err(format!("unknown database vendor `{other}`")),
        }
    }
}

/// The full logical schema of a database instance at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Version of the platform that produced the snapshot.
    pub platform: String,
    /// Database vendor the snapshot was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<DatabaseVendor>,
    /// Collections, unique by name.
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// Fields, unique by `(collection, field)`.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Relations, unique by `(collection, field)`.
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Snapshot {
    /// Create an empty snapshot for the given platform version.
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            platform: platform.into(),
            vendor: None,
            collections: Vec::new(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Set the database vendor.
    pub fn with_vendor(mut self, vendor: DatabaseVendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Add a collection.
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    /// Add a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a relation.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json_str(input: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Look up an entity of kind `E` by key.
    pub fn find<E: SchemaEntity>(&self, key: &E::Key) -> Option<&E> {
        E::of(self).iter().find(|entity| entity.matches(key))
    }

    /// Check whether an entity of kind `E` exists.
    pub fn contains<E: SchemaEntity>(&self, key: &E::Key) -> bool {
        self.find::<E>(key).is_some()
    }

    /// Check if the snapshot holds no entities at all.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.fields.is_empty() && self.relations.is_empty()
    }

    /// Sort every sequence by identity key.
    pub fn normalize(&mut self) {
        self.collections.sort_by_key(SchemaEntity::key);
        self.fields.sort_by_key(SchemaEntity::key);
        self.relations.sort_by_key(SchemaEntity::key);
    }

    /// Consume and return the normalized snapshot.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// The JSON document the versioned hash is computed over.
    pub fn to_document(&self) -> Value {
        json!({
            "version": self.version,
            "platform": self.platform,
            "vendor": self.vendor,
            "collections": self.collections.iter().map(SchemaEntity::to_document).collect::<Vec<_>>(),
            "fields": self.fields.iter().map(SchemaEntity::to_document).collect::<Vec<_>>(),
            "relations": self.relations.iter().map(SchemaEntity::to_document).collect::<Vec<_>>(),
        })
    }

    /// Attach the versioned hash.
    pub fn with_hash(self) -> SnapshotWithHash {
        let hash = versioned_hash(&self);
        SnapshotWithHash {
            snapshot: self,
            hash,
        }
    }
}

/// A snapshot together with its content fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotWithHash {
    /// The snapshot.
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// Versioned hash of `snapshot`.
    pub hash: String,
}

impl SnapshotWithHash {
    /// Drop the hash.
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

impl std::ops::Deref for SnapshotWithHash {
    type Target = Snapshot;

    fn deref(&self) -> &Snapshot {
        &self.snapshot
    }
}
