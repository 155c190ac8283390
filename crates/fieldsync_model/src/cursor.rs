//! Per-kind incremental sync bookmarks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The status of the last sync pass for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStatus {
    /// No pass has run yet, or the previous pass has returned to rest.
    Idle,
    /// A pass is in flight. A cursor stuck in this status after a restart
    /// means the process crashed mid-pass; surfaced to operators rather
    /// than retried silently.
    Syncing,
    /// The last pass completed successfully.
    Success,
    /// The last pass failed; see `last_error`.
    Error,
}

impl CursorStatus {
    /// Returns the stable snake_case name for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Per (namespace, entity kind) bookmark of the last successful sync.
///
/// Created on the first pass for a kind, written at the start and end of
/// every pass, never deleted during normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Upper bound of the last successfully processed fetch window.
    /// `None` means no successful sync yet (next fetch is unbounded).
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    /// Status of the most recent pass.
    pub last_status: CursorStatus,
    /// Failure detail from the most recent pass, if it errored.
    pub last_error: Option<String>,
    /// When this cursor row was last written.
    pub updated_at: DateTime<Utc>,
}

impl SyncCursor {
    /// Creates a fresh cursor for a kind that has never synced.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_sync_timestamp: None,
            last_status: CursorStatus::Idle,
            last_error: None,
            updated_at: now,
        }
    }

    /// Marks a pass as started.
    pub fn begin_pass(&mut self, now: DateTime<Utc>) {
        self.last_status = CursorStatus::Syncing;
        self.last_error = None;
        self.updated_at = now;
    }

    /// Records a successful pass and advances the window to `upper_bound`.
    pub fn complete(&mut self, upper_bound: DateTime<Utc>, now: DateTime<Utc>) {
        self.last_sync_timestamp = Some(upper_bound);
        self.last_status = CursorStatus::Success;
        self.last_error = None;
        self.updated_at = now;
    }

    /// Records a failed pass. The timestamp is deliberately left where it
    /// was so the same window is retried on the next cycle.
    pub fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.last_status = CursorStatus::Error;
        self.last_error = Some(message.into());
        self.updated_at = now;
    }
}
