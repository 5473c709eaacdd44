//! Live schema kept in a JSON file.

use std::path::{Path, PathBuf};

use strata_migrate::{SchemaStore, SnapshotDiff, StoreError, StoreResult, apply_diff};
use strata_schema::Snapshot;
use tracing::{debug, info};

/// A [`SchemaStore`] backed by a snapshot document on disk.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a failed apply leaves the previous schema in place. A diff is
/// only written when the file still holds its baseline.
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    path: PathBuf,
}

impl FileSchemaStore {
    /// Create a store for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The schema file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored schema.
    pub async fn write(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut text = serde_json::to_string_pretty(snapshot)?;
        text.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SchemaStore for FileSchemaStore {
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StoreError::introspection(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        Ok(snapshot.normalized())
    }

    async fn apply_diff(&self, baseline: &Snapshot, diff: &SnapshotDiff) -> StoreResult<()> {
        let live = self.snapshot().await?;
        if &live != baseline {
            debug!(path = %self.path.display(), "schema file changed since the diff was validated");
            return Err(StoreError::Conflict);
        }

        let next = apply_diff(&live, diff)?;
        self.write(&next).await?;

        info!(path = %self.path.display(), summary = %diff.summary(), "wrote schema file");
        Ok(())
    }
}
