//! Shared fixtures for strata-migrate integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use strata_migrate::{
    Accountability, MemorySchemaStore, SchemaService, SchemaServiceConfig, SchemaStore,
    SnapshotDiff, StoreError, StoreResult,
};
use strata_schema::{Collection, DatabaseVendor, Field, InstanceInfo, Relation, Snapshot};

pub const PLATFORM: &str = "1.0.0";

pub fn instance() -> InstanceInfo {
    InstanceInfo::new(PLATFORM).with_vendor(DatabaseVendor::Postgres)
}

/// A small blog schema.
pub fn blog() -> Snapshot {
    instance()
        .empty_snapshot()
        .with_collection(Collection::new("articles").with_meta(json!({ "icon": "article", "note": null })))
        .with_collection(Collection::new("users"))
        .with_field(Field::new("articles", "id", "integer").with_schema(json!({ "is_primary_key": true })))
        .with_field(Field::new("articles", "title", "string").with_meta(json!({ "required": true })))
        .with_field(Field::new("articles", "author", "uuid"))
        .with_field(Field::new("users", "id", "uuid"))
        .with_relation(Relation::new("articles", "author").related_to("users"))
        .normalized()
}

pub fn admin_service(live: Snapshot) -> SchemaService<Arc<MemorySchemaStore>> {
    service(Arc::new(MemorySchemaStore::new(live)), Accountability::admin())
}

pub fn service<S: SchemaStore>(store: S, accountability: Accountability) -> SchemaService<S> {
    SchemaService::new(store)
        .with_accountability(accountability)
        .with_config(SchemaServiceConfig::new().instance(instance()))
}

/// A store whose backend is down.
pub struct UnavailableStore;

#[async_trait::async_trait]
impl SchemaStore for UnavailableStore {
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        Err(StoreError::introspection("connection refused"))
    }

    async fn apply_diff(&self, _baseline: &Snapshot, _diff: &SnapshotDiff) -> StoreResult<()> {
        Err(StoreError::backend("connection refused"))
    }
}

/// A store whose reads lag behind a writer that already changed the schema.
pub struct LaggingStore {
    pub inner: Arc<MemorySchemaStore>,
    pub stale: Snapshot,
}

#[async_trait::async_trait]
impl SchemaStore for LaggingStore {
    async fn snapshot(&self) -> StoreResult<Snapshot> {
        Ok(self.stale.clone())
    }

    async fn apply_diff(&self, baseline: &Snapshot, diff: &SnapshotDiff) -> StoreResult<()> {
        self.inner.apply_diff(baseline, diff).await
    }
}
