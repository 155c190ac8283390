//! Incremental fetch window planning.
//!
//! For a given (namespace, entity kind) the engine computes the minimal
//! remote query window from the cursor: unbounded on the first-ever sync,
//! bounded to `modified_since = last_sync_timestamp` afterwards so
//! unmodified remote records are never re-fetched.

use chrono::{DateTime, Utc};
use fieldsync_model::{RemoteEntity, SyncCursor};

/// The remote query window for one pull pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Lower bound on remote modification time; `None` fetches everything.
    pub modified_since: Option<DateTime<Utc>>,
}

impl FetchWindow {
    /// A window with no lower bound (first-ever sync, full fetch).
    pub fn unbounded() -> Self {
        Self {
            modified_since: None,
        }
    }

    /// A window bounded to entities modified at or after `since`.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            modified_since: Some(since),
        }
    }

    /// Plans the window from a cursor.
    pub fn from_cursor(cursor: Option<&SyncCursor>) -> Self {
        match cursor.and_then(|c| c.last_sync_timestamp) {
            Some(since) => Self::since(since),
            None => Self::unbounded(),
        }
    }

    /// Returns true when this window fetches the full remote data set.
    pub fn is_full_fetch(&self) -> bool {
        self.modified_since.is_none()
    }

    /// Returns true if an entity modified at `modified_at` falls inside
    /// this window.
    pub fn contains(&self, modified_at: DateTime<Utc>) -> bool {
        match self.modified_since {
            Some(since) => modified_at >= since,
            None => true,
        }
    }
}

/// The upper bound the cursor advances to after a successful pass.
///
/// Uses the latest observed modification time among fetched entities rather
/// than "now", so records modified between fetch-start and fetch-end on a
/// skewed remote clock are not skipped. Falls back to `now` when nothing was
/// fetched: an empty diff is a successful sync, not a no-op.
pub fn window_upper_bound(fetched: &[RemoteEntity], now: DateTime<Utc>) -> DateTime<Utc> {
    fetched.iter().map(|e| e.modified_at).max().unwrap_or(now)
}
