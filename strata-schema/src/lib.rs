//! # strata-schema
//!
//! Snapshot model for the Strata schema migration engine.
//!
//! A [`Snapshot`] captures the logical schema of a database instance at one
//! instant: its collections, fields and relations. Snapshots are plain value
//! objects. They are produced fresh by introspection, compared by the diff
//! engine in `strata-migrate`, and fingerprinted with [`versioned_hash`] for
//! optimistic concurrency.
//!
//! ## Example
//!
//! ```rust
//! use strata_schema::{Collection, Field, Snapshot};
//!
//! let snapshot = Snapshot::new("1.0.0")
//!     .with_collection(Collection::new("articles"))
//!     .with_field(Field::new("articles", "title", "string"))
//!     .with_hash();
//!
//! assert_eq!(snapshot.hash.len(), 64);
//! ```

pub mod entity;
pub mod error;
pub mod hash;
pub mod snapshot;
pub mod validate;

pub use entity::{
    Collection, CollectionKey, EntityKind, Field, FieldKey, Relation, SchemaEntity,
};
pub use error::{SnapshotError, SnapshotResult};
pub use hash::versioned_hash;
pub use snapshot::{DatabaseVendor, SNAPSHOT_VERSION, Snapshot, SnapshotWithHash};
pub use validate::{InstanceInfo, validate_snapshot};
