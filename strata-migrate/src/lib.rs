//! # strata-migrate
//!
//! Diff and apply engine for Strata schema snapshots.
//!
//! This crate provides functionality for:
//! - Deep structural diffing of two snapshots into per-entity change records
//! - Structural validation of diff and patch payloads received from callers
//! - Hash-guarded application of full diffs (optimistic concurrency)
//! - Sanitizing of additive patches against the current schema
//! - An admin-gated [`SchemaService`] over an injected [`SchemaStore`]
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌────────────────┐
//! │ SchemaStore  │────▶│ Snapshot Differ│────▶│ SnapshotDiff   │
//! └──────────────┘     └────────────────┘     └────────────────┘
//!        ▲                                           │
//!        │                                           ▼
//!        │             ┌────────────────┐     ┌────────────────┐
//!        └─────────────│ apply_diff     │◀────│ Diff Validator │
//!                      └────────────────┘     │ Patch Cleaner  │
//!                                             └────────────────┘
//! ```
//!
//! A diff carries the hash of the snapshot it was computed against. Applying
//! it is accepted outright while the live schema still has that hash. After
//! a concurrent change every create and delete in the diff is re-checked
//! against the live schema, and the diff is refused with the most precise
//! conflict found.
//!
//! ## Example
//!
//! ```rust
//! use strata_migrate::{Accountability, DiffOptions, MemorySchemaStore, SchemaService};
//! use strata_migrate::{ApplyOutcome, SnapshotDiffWithHash};
//! use strata_schema::{Collection, InstanceInfo, Snapshot};
//!
//! # tokio_test_block(async {
//! let instance = InstanceInfo::new("1.0.0");
//! let store = MemorySchemaStore::new(instance.empty_snapshot());
//! let service = SchemaService::new(store)
//!     .with_accountability(Accountability::admin())
//!     .with_config(strata_migrate::SchemaServiceConfig::new().instance(instance));
//!
//! let current = service.snapshot_with_hash().await?;
//! let target = current.snapshot.clone().with_collection(Collection::new("articles"));
//!
//! let diff = service.diff(&target, DiffOptions::new()).await?.expect("one change");
//! let outcome = service.apply(&SnapshotDiffWithHash::new(current.hash, diff)).await?;
//! assert_eq!(outcome, ApplyOutcome::Applied);
//! # Ok::<(), strata_migrate::MigrationError>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
//! # }
//! ```

pub mod apply;
pub mod change;
pub mod deep;
pub mod diff;
pub mod error;
pub mod patch;
pub mod payload;
pub mod service;
pub mod store;
pub mod validate;

pub use apply::apply_diff;
pub use change::{Change, DiffKind, EntityDiff, Operation, PathSegment};
pub use deep::{apply_change, apply_changes, deep_diff};
pub use diff::{
    CollectionRef, DiffDirection, DiffEntry, DiffSummary, EntityRef, FieldRef, RelationRef,
    SnapshotDiff, SnapshotDiffWithHash, SnapshotDiffer, compute_diff,
};
pub use error::{ApplyError, MigrateResult, MigrationError, PatchError};
pub use patch::{clean_apply_patch, validate_apply_patch};
pub use service::{Accountability, ApplyOutcome, DiffOptions, SchemaService, SchemaServiceConfig};
pub use store::{MemorySchemaStore, SchemaStore, StoreError, StoreResult};
pub use validate::validate_apply_diff;
