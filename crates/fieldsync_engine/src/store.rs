//! Record store abstraction.
//!
//! The warehouse side of the engine: upsert/query over sync records plus
//! the cursor table. The production implementation lives in
//! `fieldsync_store`; [`MemoryRecordStore`] backs the engine's tests.

use crate::error::SyncResult;
use async_trait::async_trait;
use fieldsync_model::{
    CursorStatus, EntityKind, Namespace, RecordOrigin, RecordState, SyncCursor, SyncRecord,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Filter for [`RecordStore::query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Match only records in this state.
    pub state: Option<RecordState>,
    /// Match only records with this origin.
    pub origin: Option<RecordOrigin>,
}

impl RecordFilter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// The reconciliation selection: locally originated records waiting to
    /// be pushed.
    pub fn pending_local() -> Self {
        Self {
            state: Some(RecordState::Pending),
            origin: Some(RecordOrigin::Local),
        }
    }

    /// Returns true if `record` matches this filter.
    pub fn matches(&self, record: &SyncRecord) -> bool {
        self.state.map_or(true, |s| record.state == s)
            && self.origin.map_or(true, |o| record.origin == o)
    }
}

/// Per-record result of an upsert batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The record's stable store id.
    pub local_id: Uuid,
    /// The key the record was upserted by.
    pub key: String,
    /// Failure detail; `None` on success.
    pub error: Option<String>,
}

impl UpsertOutcome {
    /// Returns true if this record was written.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Upsert/query over sync records plus the per-kind cursor table.
///
/// Records key by their remote identifier (falling back to `local_id` for
/// never-pushed local records), which is what makes a retried pass
/// re-upsert the same records harmlessly. A failing record inside a batch
/// must not roll back its already-written siblings.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upserts a batch of records, reporting per-record success/failure.
    async fn upsert_batch(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        records: Vec<SyncRecord>,
    ) -> SyncResult<Vec<UpsertOutcome>>;

    /// Queries records matching `filter`.
    async fn query(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        filter: RecordFilter,
    ) -> SyncResult<Vec<SyncRecord>>;

    /// Reads the cursor for a kind; `None` before the first pass.
    async fn get_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
    ) -> SyncResult<Option<SyncCursor>>;

    /// Writes the cursor for a kind.
    async fn set_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        cursor: SyncCursor,
    ) -> SyncResult<()>;
}

type Slot = (Namespace, EntityKind);

/// An in-memory record store for testing.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<Slot, BTreeMap<String, SyncRecord>>>,
    cursors: RwLock<HashMap<Slot, SyncCursor>>,
    failing_keys: RwLock<HashSet<String>>,
    cursor_history: RwLock<Vec<(EntityKind, CursorStatus)>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects an upsert failure for every record keyed by `key`.
    pub fn fail_upserts_for(&self, key: impl Into<String>) {
        self.failing_keys.write().insert(key.into());
    }

    /// Seeds a record directly, bypassing upsert bookkeeping.
    pub fn seed_record(&self, namespace: &Namespace, kind: EntityKind, record: SyncRecord) {
        self.records
            .write()
            .entry((namespace.clone(), kind))
            .or_default()
            .insert(record.upsert_key(), record);
    }

    /// All records for a kind, ordered by key.
    pub fn records(&self, namespace: &Namespace, kind: EntityKind) -> Vec<SyncRecord> {
        self.records
            .read()
            .get(&(namespace.clone(), kind))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Looks up one record by its upsert key.
    pub fn record_by_key(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        key: &str,
    ) -> Option<SyncRecord> {
        self.records
            .read()
            .get(&(namespace.clone(), kind))
            .and_then(|m| m.get(key).cloned())
    }

    /// The sequence of cursor statuses written for a kind, in write order.
    ///
    /// Lets tests assert that `Syncing` was durably written before the
    /// remote call was issued.
    pub fn cursor_status_history(&self, kind: EntityKind) -> Vec<CursorStatus> {
        self.cursor_history
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, s)| *s)
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert_batch(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        records: Vec<SyncRecord>,
    ) -> SyncResult<Vec<UpsertOutcome>> {
        let mut map = self.records.write();
        let slot = map.entry((namespace.clone(), kind)).or_default();
        let failing = self.failing_keys.read();

        let mut outcomes = Vec::with_capacity(records.len());
        for mut record in records {
            let key = record.upsert_key();
            if failing.contains(&key) {
                outcomes.push(UpsertOutcome {
                    local_id: record.local_id,
                    key,
                    error: Some("injected upsert failure".into()),
                });
                continue;
            }

            // The store's primary key is stable across upserts of the same key.
            if let Some(existing) = slot.get(&key) {
                record.local_id = existing.local_id;
            } else if let Some(old_key) = slot
                .iter()
                .find(|(_, r)| r.local_id == record.local_id)
                .map(|(k, _)| k.clone())
            {
                // A local record that just gained its remote id moves to the
                // remote key; no stale row may stay behind under the old one.
                slot.remove(&old_key);
            }
            outcomes.push(UpsertOutcome {
                local_id: record.local_id,
                key: key.clone(),
                error: None,
            });
            slot.insert(key, record);
        }

        Ok(outcomes)
    }

    async fn query(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        filter: RecordFilter,
    ) -> SyncResult<Vec<SyncRecord>> {
        Ok(self
            .records
            .read()
            .get(&(namespace.clone(), kind))
            .map(|m| {
                m.values()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
    ) -> SyncResult<Option<SyncCursor>> {
        Ok(self.cursors.read().get(&(namespace.clone(), kind)).cloned())
    }

    async fn set_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        cursor: SyncCursor,
    ) -> SyncResult<()> {
        self.cursor_history
            .write()
            .push((kind, cursor.last_status));
        self.cursors
            .write()
            .insert((namespace.clone(), kind), cursor);
        Ok(())
    }
}
