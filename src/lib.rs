//! # Strata
//!
//! Schema snapshots, structural diffs and hash-guarded migrations.
//!
//! Strata provides:
//! - A snapshot model of collections, fields and relations with identity keys
//! - A deterministic versioned hash used as an optimistic-concurrency token
//! - Structural diffs between snapshots and their application to a live schema
//! - Additive patches reconciled against whatever already exists
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let live = Snapshot::new("1.0.0").with_collection(Collection::new("articles"));
//! let service = SchemaService::new(MemorySchemaStore::new(live))
//!     .with_accountability(Accountability::admin())
//!     .with_config(SchemaServiceConfig::new().instance(InstanceInfo::new("1.0.0")));
//!
//! let target = Snapshot::new("1.0.0")
//!     .with_collection(Collection::new("articles"))
//!     .with_field(Field::new("articles", "title", "string"));
//!
//! let current = service.snapshot_with_hash().await?;
//! let diff = service.diff(&target, DiffOptions::new()).await?.unwrap_or_default();
//! let outcome = service.apply(&SnapshotDiffWithHash::new(current.hash, diff)).await?;
//! assert_eq!(outcome, ApplyOutcome::Applied);
//! # Ok::<(), MigrationError>(())
//! # }).unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Snapshot model, identity keys, validation and hashing.
pub mod schema {
    pub use strata_schema::*;
}

/// Diffing, diff and patch application, and the schema service.
pub mod migrate {
    pub use strata_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        Accountability, ApplyOutcome, DiffOptions, MemorySchemaStore, MigrationError,
        SchemaService, SchemaServiceConfig, SchemaStore, SnapshotDiff, SnapshotDiffWithHash,
        compute_diff,
    };
    pub use crate::schema::{
        Collection, DatabaseVendor, Field, InstanceInfo, Relation, Snapshot, SnapshotWithHash,
        versioned_hash,
    };
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, SchemaService, SnapshotDiff};
pub use schema::{Snapshot, SnapshotError};
