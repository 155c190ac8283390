//! Cycle reporting types.

use crate::cursor::SyncCursor;
use crate::kind::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a single sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassDirection {
    /// Remote platform → local warehouse.
    Pull,
    /// Local warehouse → remote platform.
    Push,
}

impl PassDirection {
    /// Returns the stable snake_case name for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }
}

/// Terminal status of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// The pass completed in full.
    Success,
    /// The pass aborted or some records failed.
    Error,
}

/// The report for one directional pass over one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    /// The entity kind the pass covered.
    pub kind: EntityKind,
    /// Pull or push.
    pub direction: PassDirection,
    /// Terminal status.
    pub status: PassStatus,
    /// Number of records successfully processed.
    pub records_processed: u64,
    /// Failure detail when `status` is `Error`.
    pub error_message: Option<String>,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// When the pass finished.
    pub finished_at: DateTime<Utc>,
}

impl PassOutcome {
    /// Returns true if the pass completed in full.
    pub fn is_success(&self) -> bool {
        self.status == PassStatus::Success
    }
}

/// Aggregated report of one orchestrated cycle across all kinds.
///
/// Ephemeral: exists only to report back to the caller that triggered the
/// cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCycleResult {
    /// Every pass outcome, in execution order (all pulls, then all pushes).
    pub outcomes: Vec<PassOutcome>,
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// When the cycle finished.
    pub finished_at: DateTime<Utc>,
}

impl SyncCycleResult {
    /// Returns true if every pass in the cycle succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(PassOutcome::is_success)
    }

    /// Returns true if every pass in the cycle failed.
    ///
    /// The continuous loop uses this to switch to its error backoff.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.is_success())
    }

    /// Looks up the outcome for one kind and direction.
    pub fn outcome_for(&self, kind: EntityKind, direction: PassDirection) -> Option<&PassOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind && o.direction == direction)
    }

    /// Total records processed across all passes.
    pub fn records_processed(&self) -> u64 {
        self.outcomes.iter().map(|o| o.records_processed).sum()
    }
}

/// Control-surface snapshot of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// True while a cycle is in flight.
    pub is_running: bool,
    /// True while a continuous loop is active.
    pub continuous: bool,
    /// Last-known cursor per entity kind, straight from the record store.
    pub cursors: BTreeMap<EntityKind, SyncCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorStatus;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn outcome(kind: EntityKind, direction: PassDirection, status: PassStatus) -> PassOutcome {
        PassOutcome {
            kind,
            direction,
            status,
            records_processed: 1,
            error_message: None,
            started_at: ts("2024-05-01T00:00:00Z"),
            finished_at: ts("2024-05-01T00:00:01Z"),
        }
    }

    #[test]
    fn succeeded_and_all_failed() {
        let mut result = SyncCycleResult {
            outcomes: vec![
                outcome(EntityKind::Customer, PassDirection::Pull, PassStatus::Success),
                outcome(EntityKind::WorkOrder, PassDirection::Pull, PassStatus::Success),
            ],
            started_at: ts("2024-05-01T00:00:00Z"),
            finished_at: ts("2024-05-01T00:00:02Z"),
        };
        assert!(result.succeeded());
        assert!(!result.all_failed());

        result.outcomes[1].status = PassStatus::Error;
        assert!(!result.succeeded());
        assert!(!result.all_failed());

        result.outcomes[0].status = PassStatus::Error;
        assert!(result.all_failed());
    }

    #[test]
    fn outcome_lookup_distinguishes_direction() {
        let result = SyncCycleResult {
            outcomes: vec![
                outcome(EntityKind::Customer, PassDirection::Pull, PassStatus::Success),
                outcome(EntityKind::Customer, PassDirection::Push, PassStatus::Error),
            ],
            started_at: ts("2024-05-01T00:00:00Z"),
            finished_at: ts("2024-05-01T00:00:02Z"),
        };

        let pull = result
            .outcome_for(EntityKind::Customer, PassDirection::Pull)
            .unwrap();
        assert!(pull.is_success());

        let push = result
            .outcome_for(EntityKind::Customer, PassDirection::Push)
            .unwrap();
        assert!(!push.is_success());
    }

    #[test]
    fn status_serializes_cursor_map_by_kind_name() {
        let mut cursors = BTreeMap::new();
        cursors.insert(EntityKind::WorkOrder, SyncCursor::new(ts("2024-05-01T00:00:00Z")));
        let status = EngineStatus {
            is_running: false,
            continuous: false,
            cursors,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["cursors"]["work_order"]["last_status"], "idle");
    }

    #[test]
    fn cursor_status_names() {
        assert_eq!(CursorStatus::Success.as_str(), "success");
        assert_eq!(CursorStatus::Syncing.as_str(), "syncing");
    }
}
