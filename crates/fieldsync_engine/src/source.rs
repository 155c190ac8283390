//! Remote entity source abstraction.
//!
//! The engine never talks to the field-service platform directly; it goes
//! through this trait. The production implementation lives in
//! `fieldsync_remote` and owns all auth state, so the engine never sees or
//! manages tokens.

use crate::error::{SyncError, SyncResult};
use crate::window::FetchWindow;
use async_trait::async_trait;
use fieldsync_model::{EntityKind, RemoteEntity};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Typed fetch/create/update operations against the remote platform.
///
/// `fetch` is finite and restartable: re-issuing it with the same window
/// yields the same entities, which is what makes an aborted pull pass safe
/// to retry on the next cycle.
#[async_trait]
pub trait RemoteEntitySource: Send + Sync {
    /// Fetches entities of `kind` modified within `window`, up to
    /// `page_size` entities.
    async fn fetch(
        &self,
        kind: EntityKind,
        window: FetchWindow,
        page_size: u32,
    ) -> SyncResult<Vec<RemoteEntity>>;

    /// Creates an entity on the remote platform and returns its remote id.
    async fn create(&self, kind: EntityKind, payload: &Value) -> SyncResult<String>;

    /// Updates an existing remote entity.
    async fn update(&self, kind: EntityKind, remote_id: &str, payload: &Value) -> SyncResult<()>;
}

/// A scripted remote source for testing.
///
/// Fetch results are seeded per kind and filtered through the requested
/// window, so incremental-fetch behavior can be exercised without a network.
#[derive(Default)]
pub struct MockRemoteSource {
    entities: RwLock<HashMap<EntityKind, Vec<RemoteEntity>>>,
    fetch_errors: RwLock<HashMap<EntityKind, SyncError>>,
    create_error: RwLock<Option<SyncError>>,
    update_errors: RwLock<HashMap<String, SyncError>>,
    next_ids: RwLock<VecDeque<String>>,
    id_counter: AtomicU64,
    created: RwLock<Vec<(EntityKind, Value)>>,
    updated: RwLock<Vec<(EntityKind, String, Value)>>,
    fetch_calls: RwLock<Vec<(EntityKind, FetchWindow, u32)>>,
}

impl MockRemoteSource {
    /// Creates an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the entities returned for a kind.
    pub fn seed_entities(&self, kind: EntityKind, entities: Vec<RemoteEntity>) {
        self.entities.write().insert(kind, entities);
    }

    /// Makes every fetch for `kind` fail with `error`.
    pub fn fail_fetch(&self, kind: EntityKind, error: SyncError) {
        self.fetch_errors.write().insert(kind, error);
    }

    /// Clears a previously scripted fetch failure.
    pub fn clear_fetch_failure(&self, kind: EntityKind) {
        self.fetch_errors.write().remove(&kind);
    }

    /// Makes every create fail with `error`.
    pub fn fail_creates(&self, error: SyncError) {
        *self.create_error.write() = Some(error);
    }

    /// Makes updates for `remote_id` fail with `error`.
    pub fn fail_update_for(&self, remote_id: impl Into<String>, error: SyncError) {
        self.update_errors.write().insert(remote_id.into(), error);
    }

    /// Queues an id to hand out on the next create; after the queue drains,
    /// ids fall back to a deterministic `R-<n>` sequence.
    pub fn queue_created_id(&self, id: impl Into<String>) {
        self.next_ids.write().push_back(id.into());
    }

    /// Payloads passed to `create`, in call order.
    pub fn created(&self) -> Vec<(EntityKind, Value)> {
        self.created.read().clone()
    }

    /// Calls made to `update`, in call order.
    pub fn updated(&self) -> Vec<(EntityKind, String, Value)> {
        self.updated.read().clone()
    }

    /// Windows requested by `fetch`, in call order.
    pub fn fetch_calls(&self) -> Vec<(EntityKind, FetchWindow, u32)> {
        self.fetch_calls.read().clone()
    }
}

#[async_trait]
impl RemoteEntitySource for MockRemoteSource {
    async fn fetch(
        &self,
        kind: EntityKind,
        window: FetchWindow,
        page_size: u32,
    ) -> SyncResult<Vec<RemoteEntity>> {
        self.fetch_calls.write().push((kind, window, page_size));

        if let Some(error) = self.fetch_errors.read().get(&kind) {
            return Err(error.clone());
        }

        let entities = self
            .entities
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|e| window.contains(e.modified_at))
            .take(page_size as usize)
            .collect();

        Ok(entities)
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> SyncResult<String> {
        if let Some(error) = self.create_error.read().as_ref() {
            return Err(error.clone());
        }

        self.created.write().push((kind, payload.clone()));
        let id = self.next_ids.write().pop_front().unwrap_or_else(|| {
            format!("R-{}", self.id_counter.fetch_add(1, Ordering::SeqCst) + 1)
        });
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, remote_id: &str, payload: &Value) -> SyncResult<()> {
        if let Some(error) = self.update_errors.read().get(remote_id) {
            return Err(error.clone());
        }

        self.updated
            .write()
            .push((kind, remote_id.to_string(), payload.clone()));
        Ok(())
    }
}
