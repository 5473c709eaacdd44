//! Admin-gated orchestration of snapshot, diff and apply operations.

use serde_json::Value;
use strata_schema::{InstanceInfo, Snapshot, SnapshotWithHash, validate_snapshot};
use tracing::{debug, error, info, warn};

use crate::diff::{DiffDirection, SnapshotDiff, SnapshotDiffWithHash, SnapshotDiffer};
use crate::error::{MigrateResult, MigrationError};
use crate::patch::{clean_apply_patch, validate_apply_patch};
use crate::store::{SchemaStore, StoreError};
use crate::validate::{STALE_HASH_REASON, validate_apply_diff};

/// Who is calling the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accountability {
    /// Calling user, if known.
    pub user: Option<String>,
    /// Role of the calling user.
    pub role: Option<String>,
    /// Whether the caller has admin privilege.
    pub admin: bool,
}

impl Accountability {
    /// An anonymous admin caller.
    pub fn admin() -> Self {
        Self {
            admin: true,
            ..Self::default()
        }
    }

    /// A non-admin user.
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the admin flag.
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}

/// Options for [`SchemaService::diff`] and [`SchemaService::patch`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Already fetched current snapshot, saves an introspection round trip.
    pub current_snapshot: Option<Snapshot>,
    /// Relax the platform and vendor checks on the supplied snapshot.
    pub force: bool,
}

impl DiffOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already fetched current snapshot.
    pub fn current_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.current_snapshot = Some(snapshot);
        self
    }

    /// Relax the compatibility checks.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Configuration for the schema service.
#[derive(Debug, Clone, Default)]
pub struct SchemaServiceConfig {
    /// Identity of the running instance.
    pub instance: InstanceInfo,
}

impl SchemaServiceConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instance identity.
    pub fn instance(mut self, instance: InstanceInfo) -> Self {
        self.instance = instance;
        self
    }
}

/// What [`SchemaService::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The diff was handed to the store.
    Applied,
    /// The diff was empty.
    NothingToApply,
}

/// Orchestrates snapshots, diffs and their application to a live schema.
///
/// Every operation first checks that the caller is an admin.
pub struct SchemaService<S> {
    store: S,
    accountability: Accountability,
    config: SchemaServiceConfig,
}

impl<S: SchemaStore> SchemaService<S> {
    /// Create a service over `store`, with an anonymous non-admin caller.
    pub fn new(store: S) -> Self {
        Self {
            store,
            accountability: Accountability::default(),
            config: SchemaServiceConfig::default(),
        }
    }

    /// Set the caller.
    pub fn with_accountability(mut self, accountability: Accountability) -> Self {
        self.accountability = accountability;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SchemaServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The caller.
    pub fn accountability(&self) -> &Accountability {
        &self.accountability
    }

    fn ensure_admin(&self) -> MigrateResult<()> {
        if self.accountability.admin {
            Ok(())
        } else {
            debug!(
                user = ?self.accountability.user,
                role = ?self.accountability.role,
                "rejecting non-admin schema access"
            );
            Err(MigrationError::Forbidden)
        }
    }

    /// Read the live schema.
    pub async fn snapshot(&self) -> MigrateResult<Snapshot> {
        self.ensure_admin()?;
        self.read_current().await
    }

    /// Read the live schema together with its hash.
    pub async fn snapshot_with_hash(&self) -> MigrateResult<SnapshotWithHash> {
        self.ensure_admin()?;
        Ok(self.read_current().await?.with_hash())
    }

    /// Attach the versioned hash to a snapshot.
    pub fn hashed_snapshot(&self, snapshot: Snapshot) -> MigrateResult<SnapshotWithHash> {
        self.ensure_admin()?;
        Ok(snapshot.with_hash())
    }

    /// Changes turning the live schema into `target`, or `None` if there are
    /// none.
    pub async fn diff(
        &self,
        target: &Snapshot,
        options: DiffOptions,
    ) -> MigrateResult<Option<SnapshotDiff>> {
        self.diff_or_patch(target, options, DiffDirection::Forward).await
    }

    /// Changes turning `target` into the live schema, or `None` if there are
    /// none.
    pub async fn patch(
        &self,
        target: &Snapshot,
        options: DiffOptions,
    ) -> MigrateResult<Option<SnapshotDiff>> {
        self.diff_or_patch(target, options, DiffDirection::Reverse).await
    }

    async fn diff_or_patch(
        &self,
        target: &Snapshot,
        options: DiffOptions,
        direction: DiffDirection,
    ) -> MigrateResult<Option<SnapshotDiff>> {
        self.ensure_admin()?;
        validate_snapshot(target, &self.config.instance, options.force)?;

        let current = match options.current_snapshot {
            Some(snapshot) => snapshot,
            None => self.read_current().await?,
        };

        let diff = SnapshotDiffer::new(target)
            .with_source(&current)
            .with_direction(direction)
            .diff();

        debug!(?direction, summary = %diff.summary(), "computed snapshot diff");
        Ok((!diff.is_empty()).then_some(diff))
    }

    /// Apply a hash-guarded diff to the live schema.
    pub async fn apply(&self, payload: &SnapshotDiffWithHash) -> MigrateResult<ApplyOutcome> {
        self.ensure_admin()?;

        let current = self.read_current().await?.with_hash();
        if !validate_apply_diff(payload, &current)? {
            return Ok(ApplyOutcome::NothingToApply);
        }

        self.store
            .apply_diff(&current, &payload.diff)
            .await
            .map_err(apply_error)?;

        info!(
            user = ?self.accountability.user,
            summary = %payload.diff.summary(),
            entries = payload.diff.len(),
            baseline = %payload.hash,
            "applied schema diff"
        );
        Ok(ApplyOutcome::Applied)
    }

    /// Validate the structure of a raw `{hash, diff}` payload and apply it.
    pub async fn apply_json(&self, payload: &Value) -> MigrateResult<ApplyOutcome> {
        self.ensure_admin()?;
        let payload = SnapshotDiffWithHash::from_json(payload)?;
        self.apply(&payload).await
    }

    /// Reconcile an additive patch with the live schema and apply what is
    /// left. Returns the patch that was applied.
    pub async fn apply_patch(&self, patch: SnapshotDiff) -> MigrateResult<SnapshotDiff> {
        self.ensure_admin()?;

        let current = self.read_current().await?;
        if !validate_apply_patch(&patch)? {
            return Err(MigrationError::invalid_payload("Provided patch is empty"));
        }
        let cleaned = clean_apply_patch(patch, &current)?;

        self.store
            .apply_diff(&current, &cleaned)
            .await
            .map_err(apply_error)?;

        info!(
            user = ?self.accountability.user,
            summary = %cleaned.summary(),
            "applied schema patch"
        );
        Ok(cleaned)
    }

    /// Validate the structure of a raw patch payload and apply it.
    pub async fn apply_patch_json(&self, patch: &Value) -> MigrateResult<SnapshotDiff> {
        self.ensure_admin()?;
        let patch = SnapshotDiff::from_json(patch)?;
        self.apply_patch(patch).await
    }

    async fn read_current(&self) -> MigrateResult<Snapshot> {
        self.store.snapshot().await.map_err(internal_error)
    }
}

/// Map a failed apply. A lost race or a diff the store cannot realize is
/// the caller's to fix; anything else is internal.
fn apply_error(err: StoreError) -> MigrationError {
    match err {
        StoreError::Conflict => {
            warn!("live schema changed while the diff was being applied");
            MigrationError::invalid_payload(STALE_HASH_REASON)
        }
        StoreError::Apply(err) => {
            warn!(error = %err, "diff cannot be realized on the live schema");
            MigrationError::invalid_payload(format!(
                "Provided diff cannot be applied: {err}. Please generate a new diff and try again"
            ))
        }
        other => internal_error(other),
    }
}

fn internal_error(err: StoreError) -> MigrationError {
    error!(error = %err, "schema store call failed");
    MigrationError::InternalServerError
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySchemaStore;
    use strata_schema::Collection;

    fn service(accountability: Accountability) -> SchemaService<MemorySchemaStore> {
        let live = Snapshot::new("1.0.0").with_collection(Collection::new("articles"));
        SchemaService::new(MemorySchemaStore::new(live))
            .with_accountability(accountability)
            .with_config(SchemaServiceConfig::new().instance(InstanceInfo::new("1.0.0")))
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden_everywhere() {
        let service = service(Accountability::user("alice"));
        let target = Snapshot::new("1.0.0");

        assert!(matches!(service.snapshot().await, Err(MigrationError::Forbidden)));
        assert!(matches!(service.snapshot_with_hash().await, Err(MigrationError::Forbidden)));
        assert!(matches!(service.hashed_snapshot(target.clone()), Err(MigrationError::Forbidden)));
        assert!(matches!(
            service.diff(&target, DiffOptions::new()).await,
            Err(MigrationError::Forbidden)
        ));
        assert!(matches!(
            service.patch(&target, DiffOptions::new()).await,
            Err(MigrationError::Forbidden)
        ));
        // checked before the payload is even parsed
        assert!(matches!(
            service.apply_json(&Value::Null).await,
            Err(MigrationError::Forbidden)
        ));
        assert!(matches!(
            service.apply_patch(SnapshotDiff::default()).await,
            Err(MigrationError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_role_does_not_grant_admin() {
        let service = service(Accountability::user("alice").with_role("editor"));
        assert_eq!(service.accountability().role.as_deref(), Some("editor"));
        assert!(matches!(service.snapshot().await, Err(MigrationError::Forbidden)));
    }

    #[tokio::test]
    async fn test_diff_of_current_is_none() {
        let service = service(Accountability::admin());
        let current = service.snapshot().await.unwrap();
        assert_eq!(service.diff(&current, DiffOptions::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_diff_rejects_foreign_platform_unless_forced() {
        let service = service(Accountability::admin());
        let target = Snapshot::new("2.0.0").with_collection(Collection::new("orders"));

        let err = service.diff(&target, DiffOptions::new()).await.unwrap_err();
        assert!(err.reason().unwrap().contains("2.0.0"));

        let diff = service
            .diff(&target, DiffOptions::new().force(true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(diff.summary().create, 1);
        assert_eq!(diff.summary().delete, 1);
    }

    #[tokio::test]
    async fn test_supplied_current_snapshot_is_used() {
        let service = service(Accountability::admin());
        let target = Snapshot::new("1.0.0").with_collection(Collection::new("articles"));
        let supplied = Snapshot::new("1.0.0");

        let diff = service
            .diff(&target, DiffOptions::new().current_snapshot(supplied))
            .await
            .unwrap()
            .unwrap();
        assert!(diff.collections[0].diff.is_create());
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let service = service(Accountability::admin());
        let err = service.apply_patch(SnapshotDiff::default()).await.unwrap_err();
        assert_eq!(err.reason(), Some("Provided patch is empty"));
    }
}
