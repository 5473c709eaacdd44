//! Collaborators owning the live schema.

use std::sync::Arc;

use parking_lot::RwLock;
use strata_schema::Snapshot;
use thiserror::Error;
use tracing::{debug, info};

use crate::apply::apply_diff;
use crate::diff::SnapshotDiff;
use crate::error::ApplyError;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a [`SchemaStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the live schema failed.
    #[error("schema introspection failed: {0}")]
    Introspection(String),

    /// The diff could not be realized.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// The live schema no longer matches the baseline the diff was
    /// validated against.
    #[error("live schema changed after the diff baseline was read")]
    Conflict,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored schema could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// Create an introspection error.
    pub fn introspection(message: impl Into<String>) -> Self {
        Self::Introspection(message.into())
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Narrow interface to the live schema.
///
/// `apply_diff` is expected to be all-or-nothing, and to fail with
/// [`StoreError::Conflict`] without mutating anything when the live schema
/// is no longer `baseline`.
#[async_trait::async_trait]
pub trait SchemaStore: Send + Sync {
    /// Read the live schema.
    async fn snapshot(&self) -> StoreResult<Snapshot>;

    /// Mutate the live schema so that `diff` is realized on top of
    /// `baseline`.
    async fn apply_diff(&self, baseline: &Snapshot, diff: &SnapshotDiff) -> StoreResult<()>;
}

#[async_trait::async_trait]
impl<S: SchemaStore + ?Sized> SchemaStore for Arc<S> {
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        (**self).snapshot().await
    }

    async fn apply_diff(&self, baseline: &Snapshot, diff: &SnapshotDiff) -> StoreResult<()> {
        (**self).apply_diff(baseline, diff).await
    }
}

/// A live schema held in memory.
///
/// Every applied diff is recorded, so callers can inspect exactly which
/// mutations were requested.
#[derive(Debug)]
pub struct MemorySchemaStore {
    live: RwLock<Snapshot>,
    applied: RwLock<Vec<SnapshotDiff>>,
}

impl MemorySchemaStore {
    /// Create a store holding `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            live: RwLock::new(snapshot.normalized()),
            applied: RwLock::new(Vec::new()),
        }
    }

    /// The live schema.
    pub fn current(&self) -> Snapshot {
        self.live.read().clone()
    }

    /// Every diff applied so far, oldest first.
    pub fn applied_diffs(&self) -> Vec<SnapshotDiff> {
        self.applied.read().clone()
    }

    /// Replace the live schema, as a concurrent writer would.
    pub fn replace(&self, snapshot: Snapshot) {
        *self.live.write() = snapshot.normalized();
    }
}

#[async_trait::async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        Ok(self.current())
    }

    async fn apply_diff(&self, baseline: &Snapshot, diff: &SnapshotDiff) -> StoreResult<()> {
        let mut live = self.live.write();
        if *live != *baseline {
            debug!("live schema differs from the diff baseline");
            return Err(StoreError::Conflict);
        }
        let next = apply_diff(&live, diff)?;
        *live = next;
        self.applied.write().push(diff.clone());

        info!(summary = %diff.summary(), "applied diff to in-memory schema");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::compute_diff;
    use strata_schema::Collection;

    #[tokio::test]
    async fn test_memory_store_applies_and_records() {
        let store = MemorySchemaStore::new(Snapshot::new("1.0.0"));
        let baseline = store.snapshot().await.unwrap();
        let target = baseline.clone().with_collection(Collection::new("orders"));
        let diff = compute_diff(&baseline, &target);

        store.apply_diff(&baseline, &diff).await.unwrap();

        assert_eq!(store.current(), target);
        assert_eq!(store.applied_diffs(), vec![diff]);
    }

    #[tokio::test]
    async fn test_failed_apply_leaves_schema_untouched() {
        let start = Snapshot::new("1.0.0").with_collection(Collection::new("orders"));
        let store = MemorySchemaStore::new(start.clone());
        let diff = compute_diff(&Snapshot::new("1.0.0"), &start);

        let err = store.apply_diff(&start, &diff).await.unwrap_err();
        assert!(matches!(err, StoreError::Apply(ApplyError::AlreadyExists { .. })));
        assert_eq!(store.current(), start);
        assert!(store.applied_diffs().is_empty());
    }

    #[tokio::test]
    async fn test_second_apply_on_same_baseline_conflicts() {
        let baseline = Snapshot::new("1.0.0").with_collection(Collection::new("a"));
        let store = MemorySchemaStore::new(baseline.clone());
        let add_b = compute_diff(&baseline, &baseline.clone().with_collection(Collection::new("b")));
        let add_c = compute_diff(&baseline, &baseline.clone().with_collection(Collection::new("c")));

        store.apply_diff(&baseline, &add_b).await.unwrap();
        let err = store.apply_diff(&baseline, &add_c).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict));
        let names: Vec<_> = store.current().collections.into_iter().map(|c| c.collection).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.applied_diffs(), vec![add_b]);
    }

    #[tokio::test]
    async fn test_arc_forwards() {
        let store = Arc::new(MemorySchemaStore::new(Snapshot::new("1.0.0")));
        let snapshot = SchemaStore::snapshot(&store).await.unwrap();
        assert!(snapshot.is_empty());
    }
}
