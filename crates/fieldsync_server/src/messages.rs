//! Request and response bodies for the control surface.

use chrono::{DateTime, Utc};
use fieldsync_model::{EntityKind, RecordOrigin, RecordState, SyncCycleResult, SyncRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the manual sync trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Run even if a cycle is already in flight (the forced cycle waits
    /// for the in-flight one instead of racing it).
    #[serde(default)]
    pub force: bool,
}

/// Response body for the manual sync trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// Human-readable summary.
    pub message: String,
    /// The full per-pass report of the cycle that ran.
    pub result: SyncCycleResult,
}

/// Request body for starting continuous sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    /// Idle seconds between cycles; the server default applies when absent.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// Human-readable summary.
    pub message: String,
}

/// An inbound webhook event from the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `work_order_updated`.
    pub event_type: String,
    /// Event payload as sent by the platform; opaque here.
    pub data: Value,
    /// Sender-side timestamp.
    pub timestamp: String,
}

/// Response body for the webhook receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Human-readable summary.
    pub message: String,
    /// Whether the event caused a sync cycle to run.
    pub triggered: bool,
}

/// Request body for the record read-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsRequest {
    /// The entity kind to read.
    pub kind: EntityKind,
    /// Optional record-state filter.
    #[serde(default)]
    pub state: Option<RecordState>,
    /// Optional origin filter.
    #[serde(default)]
    pub origin: Option<RecordOrigin>,
}

/// Response body for the record read-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    /// The entity kind that was read.
    pub kind: EntityKind,
    /// Number of records returned.
    pub count: usize,
    /// The records themselves.
    pub records: Vec<SyncRecord>,
}

/// Response body for the health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers at all.
    pub status: String,
    /// Server time of the check.
    pub timestamp: DateTime<Utc>,
}
