//! Configuration for the sync engine.

use fieldsync_model::{EntityKind, Namespace};
use std::time::Duration;

/// Configuration for one namespace's sync worker.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The namespace this engine owns.
    pub namespace: Namespace,
    /// Entity kinds to sync, in referential dependency order.
    pub kinds: Vec<EntityKind>,
    /// Maximum entities fetched per pull pass.
    pub page_size: u32,
    /// Idle time between cycles in continuous mode.
    pub sync_interval: Duration,
    /// Idle time after a cycle in which every pass failed.
    /// Shorter than `sync_interval` so a broken collaborator is reprobed
    /// promptly once it recovers.
    pub error_backoff: Duration,
}

impl EngineConfig {
    /// Creates a configuration for a namespace with default tuning.
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            kinds: EntityKind::dependency_order().to_vec(),
            page_size: 100,
            sync_interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(60),
        }
    }

    /// Restricts the engine to a subset of kinds (dependency order is the
    /// caller's responsibility).
    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Sets the pull page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the idle time between continuous cycles.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the idle time after an all-failed cycle.
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(Namespace::field_service())
    }
}
