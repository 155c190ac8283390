//! Sync records and the raw entities they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A raw entity as returned by the remote platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    /// The remote platform's identifier for this entity.
    pub remote_id: String,
    /// When the entity was last modified on the remote platform.
    pub modified_at: DateTime<Utc>,
    /// The entity body, opaque to the engine.
    pub payload: Value,
}

impl RemoteEntity {
    /// Creates a remote entity.
    pub fn new(remote_id: impl Into<String>, modified_at: DateTime<Utc>, payload: Value) -> Self {
        Self {
            remote_id: remote_id.into(),
            modified_at,
            payload,
        }
    }
}

/// Which side last produced the authoritative value of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// The remote platform is authoritative.
    Remote,
    /// The local warehouse is authoritative (a pending local edit).
    Local,
}

impl RecordOrigin {
    /// Returns the stable snake_case name for this origin.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

/// Per-record synchronization state.
///
/// Mutated exclusively by the sync engine; the control surface only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Locally modified, waiting to be pushed to the remote platform.
    Pending,
    /// A push for this record is in flight.
    Syncing,
    /// Both sides agree on this record.
    Synced,
    /// The last sync attempt for this record failed.
    Error,
}

impl RecordState {
    /// Returns the stable snake_case name for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// The canonical unit moved between the remote platform and the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Store primary key, stable across the record's lifetime.
    pub local_id: Uuid,
    /// Remote platform identifier; `None` until the first successful push.
    pub remote_id: Option<String>,
    /// Which side last produced the authoritative value.
    pub origin: RecordOrigin,
    /// Current synchronization state.
    pub state: RecordState,
    /// The record body, opaque to the engine.
    pub payload: Value,
    /// Last observed modification time on the remote platform.
    pub last_modified_remote: Option<DateTime<Utc>>,
    /// Last modification time in the local warehouse.
    pub last_modified_local: DateTime<Utc>,
    /// Failure detail; set only when `state` is [`RecordState::Error`].
    pub error_message: Option<String>,
}

impl SyncRecord {
    /// Builds a record from a fetched remote entity.
    ///
    /// The record is already authoritative on both sides once upserted, so
    /// it starts out `Synced` with origin `Remote`.
    pub fn from_remote(entity: &RemoteEntity, now: DateTime<Utc>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: Some(entity.remote_id.clone()),
            origin: RecordOrigin::Remote,
            state: RecordState::Synced,
            payload: entity.payload.clone(),
            last_modified_remote: Some(entity.modified_at),
            last_modified_local: now,
            error_message: None,
        }
    }

    /// Builds a locally originated record that has never been pushed.
    pub fn local(payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: None,
            origin: RecordOrigin::Local,
            state: RecordState::Pending,
            payload,
            last_modified_remote: None,
            last_modified_local: now,
            error_message: None,
        }
    }

    /// The key the store upserts by: the remote identifier when known,
    /// otherwise the stable local id.
    ///
    /// A never-pushed local record has no remote id, so it can never collide
    /// with a remote-keyed upsert and self-overwrite during a pull pass.
    pub fn upsert_key(&self) -> String {
        match &self.remote_id {
            Some(id) => id.clone(),
            None => self.local_id.to_string(),
        }
    }

    /// Marks the record synced after a successful push.
    ///
    /// The remote copy is now authoritative, so origin flips to `Remote`.
    pub fn mark_synced(&mut self, now: DateTime<Utc>) {
        self.state = RecordState::Synced;
        self.origin = RecordOrigin::Remote;
        self.error_message = None;
        self.last_modified_local = now;
    }

    /// Marks the record failed with a message.
    pub fn mark_error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.state = RecordState::Error;
        self.error_message = Some(message.into());
        self.last_modified_local = now;
    }
}
