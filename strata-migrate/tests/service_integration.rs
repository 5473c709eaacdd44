//! End-to-end tests of the schema service over an in-memory store.

mod common;

use std::sync::Arc;

use common::{LaggingStore, UnavailableStore, admin_service, blog, instance, service};
use pretty_assertions::assert_eq;
use serde_json::json;
use strata_migrate::{
    Accountability, ApplyOutcome, Change, CollectionRef, DiffEntry, DiffOptions, EntityDiff,
    MemorySchemaStore, MigrationError, Operation, SchemaStore, SnapshotDiff, SnapshotDiffWithHash,
    compute_diff,
};
use strata_schema::{Collection, Field, SchemaEntity, Snapshot};

fn reason(err: MigrationError) -> String {
    match err {
        MigrationError::InvalidPayload { reason } => reason,
        other => panic!("expected an invalid payload error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_new_collection_end_to_end() {
    let live = instance().empty_snapshot().with_collection(Collection::new("a"));
    let service = admin_service(live.clone());
    let target = live.with_collection(Collection::new("b"));

    let current = service.snapshot_with_hash().await.unwrap();
    let diff = service.diff(&target, DiffOptions::new()).await.unwrap().unwrap();

    assert_eq!(diff.collections.len(), 1);
    assert_eq!(diff.collections[0].target.collection, "b");
    assert_eq!(diff.collections[0].operation(), Operation::Create);
    assert!(diff.fields.is_empty());
    assert!(diff.relations.is_empty());

    let outcome = service
        .apply(&SnapshotDiffWithHash::new(current.hash, diff.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied);

    assert_eq!(service.store().applied_diffs(), vec![diff]);
    assert_eq!(service.store().current(), target.normalized());
}

#[tokio::test]
async fn test_empty_diff_applies_nothing() {
    let service = admin_service(blog());
    let payload = SnapshotDiffWithHash::new("whatever", SnapshotDiff::default());

    assert_eq!(service.apply(&payload).await.unwrap(), ApplyOutcome::NothingToApply);
    assert!(service.store().applied_diffs().is_empty());
}

#[tokio::test]
async fn test_racing_appliers_same_entity() {
    let service = admin_service(blog());
    let baseline = service.snapshot_with_hash().await.unwrap();
    let target = baseline.snapshot.clone().with_collection(Collection::new("orders"));
    let diff = compute_diff(&baseline, &target);
    let payload = SnapshotDiffWithHash::new(baseline.hash.clone(), diff);

    assert_eq!(service.apply(&payload).await.unwrap(), ApplyOutcome::Applied);

    let err = service.apply(&payload).await.unwrap_err();
    assert_eq!(
        reason(err),
        "Provided diff is trying to create collection \"orders\" but it already exists. \
         Please generate a new diff and try again"
    );
    assert_eq!(service.store().applied_diffs().len(), 1);
}

#[tokio::test]
async fn test_racing_appliers_unrelated_entities() {
    let service = admin_service(blog());
    let baseline = service.snapshot_with_hash().await.unwrap();

    let first = compute_diff(
        &baseline,
        &baseline.snapshot.clone().with_collection(Collection::new("orders")),
    );
    let second = compute_diff(
        &baseline,
        &baseline.snapshot.clone().with_collection(Collection::new("invoices")),
    );

    service
        .apply(&SnapshotDiffWithHash::new(baseline.hash.clone(), first))
        .await
        .unwrap();
    let err = service
        .apply(&SnapshotDiffWithHash::new(baseline.hash.clone(), second))
        .await
        .unwrap_err();

    assert!(reason(err).starts_with("Provided hash does not match the current instance's schema hash"));
}

#[tokio::test]
async fn test_stale_delete_of_missing_field() {
    let service = admin_service(blog());
    let baseline = service.snapshot_with_hash().await.unwrap();

    let mut target = baseline.snapshot.clone();
    target.fields.retain(|f| f.key().to_string() != "articles.title");
    let diff = compute_diff(&baseline, &target);

    // someone else already dropped the field
    service.store().replace(target);

    let err = service
        .apply(&SnapshotDiffWithHash::new(baseline.hash.clone(), diff))
        .await
        .unwrap_err();
    assert!(reason(err).contains("trying to delete field \"articles.title\" but it does not exist"));
}

#[tokio::test]
async fn test_apply_json_reports_first_violation() {
    let service = admin_service(blog());
    let payload = json!({
        "hash": "abc",
        "diff": {
            "collections": [{ "collection": "orders", "diff": [{ "kind": "Z" }] }],
            "fields": [],
            "relations": []
        }
    });

    let err = service.apply_json(&payload).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_PAYLOAD");
    assert_eq!(reason(err), "\"diff.collections[0].diff[0].kind\" must be one of [N, E, D, A]");
}

#[tokio::test]
async fn test_apply_json_round_trips_wire_format() {
    let service = admin_service(blog());
    let current = service.snapshot_with_hash().await.unwrap();
    let mut target = current.snapshot.clone();
    target.collections[0].meta = Some(json!({ "icon": "feed", "note": "pinned" }));

    let diff = service.diff(&target, DiffOptions::new()).await.unwrap().unwrap();
    let wire = serde_json::to_value(SnapshotDiffWithHash::new(current.hash.clone(), diff)).unwrap();

    assert_eq!(service.apply_json(&wire).await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(service.store().current(), target.normalized());
}

#[tokio::test]
async fn test_patch_is_the_reverse_diff() {
    let service = admin_service(blog());
    let older = {
        let mut s = blog();
        s.fields.retain(|f| f.field != "title");
        s
    };

    // what would bring `older` up to the live schema
    let patch = service.patch(&older, DiffOptions::new()).await.unwrap().unwrap();
    assert_eq!(patch.fields.len(), 1);
    assert_eq!(patch.fields[0].operation(), Operation::Create);
    assert_eq!(patch.fields[0].target.field, "title");

    let diff = service.diff(&older, DiffOptions::new()).await.unwrap().unwrap();
    assert_eq!(diff.fields[0].operation(), Operation::Delete);

    let forward = service
        .diff(&blog(), DiffOptions::new().current_snapshot(older.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forward.fields[0].operation(), Operation::Create);
}

#[tokio::test]
async fn test_apply_patch_reclassifies_and_drops() {
    let live = blog().with_collection(Collection::new("orders").with_meta(json!({ "description": "Orders" })));
    let service = admin_service(live);

    let proposed_orders = Collection::new("orders").with_meta(json!({ "description": "Customer orders" }));
    let patch = SnapshotDiff {
        collections: vec![
            DiffEntry::new(
                CollectionRef { collection: "orders".into() },
                EntityDiff::create(proposed_orders.to_document()),
            ),
            DiffEntry::new(
                CollectionRef { collection: "users".into() },
                EntityDiff::create(Collection::new("users").to_document()),
            ),
        ],
        fields: vec![DiffEntry::new(
            strata_migrate::FieldRef { collection: "orders".into(), field: "status".into() },
            EntityDiff::create(Field::new("orders", "status", "string").to_document()),
        )],
        relations: Vec::new(),
    };

    let applied = service.apply_patch(patch).await.unwrap();

    assert_eq!(applied.collections.len(), 1);
    assert_eq!(applied.collections[0].target.collection, "orders");
    assert_eq!(applied.collections[0].operation(), Operation::Update);
    assert_eq!(applied.fields[0].operation(), Operation::Create);

    let live = service.store().current();
    let orders = live.collections.iter().find(|c| c.collection == "orders").unwrap();
    assert_eq!(orders.meta, Some(json!({ "description": "Customer orders" })));
    assert!(live.fields.iter().any(|f| f.collection == "orders" && f.field == "status"));
}

#[tokio::test]
async fn test_apply_patch_with_nothing_left() {
    let service = admin_service(blog());
    let patch = SnapshotDiff {
        collections: vec![DiffEntry::new(
            CollectionRef { collection: "users".into() },
            EntityDiff::create(Collection::new("users").to_document()),
        )],
        ..Default::default()
    };

    let err = service.apply_patch(patch).await.unwrap_err();
    assert_eq!(reason(err), "All elements are already created. Nothing to do");
    assert!(service.store().applied_diffs().is_empty());
}

#[tokio::test]
async fn test_apply_patch_json_rejects_deletes() {
    let service = admin_service(blog());
    let patch = json!({
        "collections": [{ "collection": "users", "diff": [{ "kind": "D", "lhs": { "collection": "users" } }] }],
        "fields": [],
        "relations": []
    });

    let err = service.apply_patch_json(&patch).await.unwrap_err();
    assert!(reason(err).starts_with("Provided patch is trying to delete the collection \"users\""));
}

#[tokio::test]
async fn test_collaborator_failure_is_internal() {
    let service = service(UnavailableStore, Accountability::admin());

    let err = service.snapshot().await.unwrap_err();
    assert!(matches!(err, MigrationError::InternalServerError));
    assert_eq!(err.status(), 500);
    // the backend message is not leaked
    assert!(!err.to_string().contains("connection refused"));

    let err = service
        .apply(&SnapshotDiffWithHash::new(
            "abc",
            compute_diff(&Snapshot::new("1.0.0"), &blog()),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::InternalServerError));
}

#[tokio::test]
async fn test_non_admin_cannot_apply() {
    let store = Arc::new(MemorySchemaStore::new(blog()));
    let service = service(Arc::clone(&store), Accountability::user("editor"));

    let current = store.snapshot().await.unwrap().with_hash();
    let diff = compute_diff(&current, &current.snapshot.clone().with_collection(Collection::new("x")));
    let err = service
        .apply(&SnapshotDiffWithHash::new(current.hash.clone(), diff))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "FORBIDDEN");
    assert!(store.applied_diffs().is_empty());
}

#[tokio::test]
async fn test_apply_cannot_rename_or_duplicate_collections() {
    let service = admin_service(blog());
    let current = service.snapshot_with_hash().await.unwrap();

    let mut rename = SnapshotDiff::default();
    rename.collections.push(DiffEntry::new(
        CollectionRef { collection: "users".into() },
        EntityDiff::from_changes(vec![Change::edited(
            vec!["collection".into()],
            json!("users"),
            json!("articles"),
        )])
        .unwrap(),
    ));
    let err = service
        .apply(&SnapshotDiffWithHash::new(current.hash.clone(), rename))
        .await
        .unwrap_err();
    assert!(reason(err).contains("cannot change an identity"));

    let wire = json!({
        "hash": current.hash,
        "diff": {
            "collections": [{ "collection": "orders", "diff": [{ "kind": "N", "rhs": { "collection": "articles" } }] }],
            "fields": [],
            "relations": []
        }
    });
    let err = service.apply_json(&wire).await.unwrap_err();
    assert_eq!(
        reason(err),
        "\"diff.collections[0].diff[0].rhs.collection\" must match the identity of the entry"
    );

    assert!(service.store().applied_diffs().is_empty());
    assert_eq!(service.store().current(), blog());
}

#[tokio::test]
async fn test_only_one_of_two_fast_path_appliers_wins() {
    let baseline = instance()
        .empty_snapshot()
        .with_collection(Collection::new("a"))
        .normalized();
    let live = Arc::new(MemorySchemaStore::new(baseline.clone()));
    let hash = baseline.clone().with_hash().hash;

    let add_b = compute_diff(&baseline, &baseline.clone().with_collection(Collection::new("b")));
    let add_c = compute_diff(&baseline, &baseline.clone().with_collection(Collection::new("c")));

    let first = service(live.clone(), Accountability::admin());
    assert_eq!(
        first.apply(&SnapshotDiffWithHash::new(hash.clone(), add_b)).await.unwrap(),
        ApplyOutcome::Applied
    );

    // The second caller read the schema before the first write landed
    let second = service(
        LaggingStore { inner: live.clone(), stale: baseline },
        Accountability::admin(),
    );
    let err = second
        .apply(&SnapshotDiffWithHash::new(hash, add_c))
        .await
        .unwrap_err();
    assert!(reason(err).starts_with("Provided hash does not match"));

    let names: Vec<_> = live.current().collections.into_iter().map(|c| c.collection).collect();
    assert_eq!(names, vec!["a", "b"]);
}
