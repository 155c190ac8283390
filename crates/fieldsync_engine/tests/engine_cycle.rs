//! End-to-end cycle scenarios over the in-memory collaborators.

use chrono::{DateTime, Utc};
use fieldsync_engine::{
    EngineConfig, MemoryRecordStore, MockRemoteSource, RecordFilter, RecordStore, SyncEngine,
};
use fieldsync_model::{
    CursorStatus, EntityKind, Namespace, PassDirection, RecordOrigin, RecordState, RemoteEntity,
    SyncCursor, SyncRecord,
};
use serde_json::json;
use std::sync::Arc;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn engine_with(
    kinds: Vec<EntityKind>,
) -> (
    Arc<SyncEngine<MockRemoteSource, MemoryRecordStore>>,
    Namespace,
) {
    let config = EngineConfig::default().with_kinds(kinds);
    let namespace = config.namespace.clone();
    let engine = Arc::new(SyncEngine::new(
        config,
        MockRemoteSource::new(),
        MemoryRecordStore::new(),
    ));
    (engine, namespace)
}

/// First-run scenario: no cursor, three work orders on the remote side.
#[tokio::test]
async fn first_run_pulls_everything_and_books_success() {
    let (engine, _ns) = engine_with(vec![EntityKind::WorkOrder]);
    let source: &MockRemoteSource = engine_source(&engine);
    source.seed_entities(
        EntityKind::WorkOrder,
        vec![
            RemoteEntity::new("WO-1", ts("2024-06-01T08:00:00Z"), json!({"subject": "a"})),
            RemoteEntity::new("WO-2", ts("2024-06-01T09:00:00Z"), json!({"subject": "b"})),
            RemoteEntity::new("WO-3", ts("2024-06-01T10:00:00Z"), json!({"subject": "c"})),
        ],
    );

    let result = engine.trigger_manual(false).await.unwrap();
    assert!(result.succeeded());

    let records = engine
        .records(EntityKind::WorkOrder, RecordFilter::all())
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .all(|r| r.state == RecordState::Synced && r.origin == RecordOrigin::Remote));

    let status = engine.status().await.unwrap();
    let cursor = &status.cursors[&EntityKind::WorkOrder];
    assert_eq!(cursor.last_status, CursorStatus::Success);
    assert_eq!(cursor.last_sync_timestamp, Some(ts("2024-06-01T10:00:00Z")));
}

/// Incremental correctness: cursor at t2 fetches only entities modified at
/// or after t2 and advances to at least t3.
#[tokio::test]
async fn incremental_fetch_respects_cursor_window() {
    let (engine, ns) = engine_with(vec![EntityKind::Customer]);
    let source = engine_source(&engine);
    let store = engine_store(&engine);

    source.seed_entities(
        EntityKind::Customer,
        vec![
            RemoteEntity::new("C-1", ts("2024-06-01T01:00:00Z"), json!({"name": "old"})),
            RemoteEntity::new("C-2", ts("2024-06-01T02:00:00Z"), json!({"name": "mid"})),
            RemoteEntity::new("C-3", ts("2024-06-01T03:00:00Z"), json!({"name": "new"})),
        ],
    );

    let mut cursor = SyncCursor::new(ts("2024-06-01T00:00:00Z"));
    cursor.complete(ts("2024-06-01T02:00:00Z"), ts("2024-06-01T02:00:01Z"));
    store
        .set_cursor(&ns, EntityKind::Customer, cursor)
        .await
        .unwrap();

    let result = engine.run_cycle().await;
    let pull = result
        .outcome_for(EntityKind::Customer, PassDirection::Pull)
        .unwrap();
    assert!(pull.is_success());
    assert_eq!(pull.records_processed, 2);

    // Only C-2 and C-3 were inside the window.
    let records = engine
        .records(EntityKind::Customer, RecordFilter::all())
        .await
        .unwrap();
    let mut ids: Vec<_> = records
        .iter()
        .filter_map(|r| r.remote_id.as_deref())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["C-2", "C-3"]);

    let status = engine.status().await.unwrap();
    let cursor = &status.cursors[&EntityKind::Customer];
    assert!(cursor.last_sync_timestamp.unwrap() >= ts("2024-06-01T03:00:00Z"));
}

/// Full bidirectional cycle: remote changes land locally while a pending
/// local record is created remotely, in the same cycle, pull first.
#[tokio::test]
async fn bidirectional_cycle_pull_then_push() {
    let (engine, ns) = engine_with(vec![EntityKind::Customer, EntityKind::WorkOrder]);
    let source = engine_source(&engine);
    let store = engine_store(&engine);

    source.seed_entities(
        EntityKind::Customer,
        vec![RemoteEntity::new(
            "C-1",
            ts("2024-06-01T08:00:00Z"),
            json!({"name": "Acme"}),
        )],
    );
    store.seed_record(
        &ns,
        EntityKind::WorkOrder,
        SyncRecord::local(json!({"subject": "install"}), ts("2024-06-01T07:00:00Z")),
    );
    source.queue_created_id("WO-42");

    let result = engine.run_cycle().await;
    assert!(result.succeeded());

    // Pull landed the customer.
    let customers = engine
        .records(EntityKind::Customer, RecordFilter::all())
        .await
        .unwrap();
    assert_eq!(customers.len(), 1);

    // Push created the work order remotely and captured its id.
    let created = source.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, EntityKind::WorkOrder);
    let work_order = store
        .record_by_key(&ns, EntityKind::WorkOrder, "WO-42")
        .unwrap();
    assert_eq!(work_order.state, RecordState::Synced);
    assert_eq!(work_order.remote_id.as_deref(), Some("WO-42"));

    // Every pull outcome precedes every push outcome.
    let first_push = result
        .outcomes
        .iter()
        .position(|o| o.direction == PassDirection::Push)
        .unwrap();
    assert!(result.outcomes[..first_push]
        .iter()
        .all(|o| o.direction == PassDirection::Pull));

    // Nothing pending remains.
    let pending = engine
        .records(EntityKind::WorkOrder, RecordFilter::pending_local())
        .await
        .unwrap();
    assert!(pending.is_empty());
}

/// A cycle with no changes on either side is a clean success and leaves
/// the store untouched.
#[tokio::test]
async fn quiet_cycle_is_a_success() {
    let (engine, _ns) = engine_with(EntityKind::dependency_order().to_vec());

    let first = engine.run_cycle().await;
    assert!(first.succeeded());
    assert_eq!(first.records_processed(), 0);

    let second = engine.run_cycle().await;
    assert!(second.succeeded());
    assert_eq!(second.records_processed(), 0);

    let status = engine.status().await.unwrap();
    assert_eq!(status.cursors.len(), 4);
    assert!(status
        .cursors
        .values()
        .all(|c| c.last_status == CursorStatus::Success));
}

// Accessor helpers: the integration tests drive the engine through its
// public surface but still need to script the collaborators it owns.

fn engine_source(
    engine: &Arc<SyncEngine<MockRemoteSource, MemoryRecordStore>>,
) -> &MockRemoteSource {
    engine.source_ref()
}

fn engine_store(
    engine: &Arc<SyncEngine<MockRemoteSource, MemoryRecordStore>>,
) -> &MemoryRecordStore {
    engine.store_ref()
}
