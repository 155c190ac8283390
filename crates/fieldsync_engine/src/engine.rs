//! The sync engine: per-kind passes, cycle orchestration, loop control.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::source::RemoteEntitySource;
use crate::store::{RecordFilter, RecordStore};
use crate::window::{window_upper_bound, FetchWindow};
use chrono::Utc;
use fieldsync_model::{
    EngineStatus, EntityKind, PassDirection, PassOutcome, PassStatus, SyncCursor, SyncCycleResult,
    SyncRecord,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The sync engine for one namespace.
///
/// Orchestrates pull (remote → warehouse) and push (warehouse → remote)
/// passes across entity kinds, maintains the per-kind cursors, and exposes
/// the trigger/status operations consumed by the control surface.
///
/// One engine instance is the single logical sync worker for its namespace:
/// cycles are serialized on an internal lock, so concurrent cycles can never
/// race on the same cursor rows. Different namespaces get different engine
/// instances and share no mutable state.
pub struct SyncEngine<R: RemoteEntitySource, S: RecordStore> {
    config: EngineConfig,
    source: Arc<R>,
    store: Arc<S>,
    cycle_lock: tokio::sync::Mutex<()>,
    is_running: AtomicBool,
    loop_active: AtomicBool,
    stop_requested: AtomicBool,
    stop_notify: tokio::sync::Notify,
    loop_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<R, S> SyncEngine<R, S>
where
    R: RemoteEntitySource + 'static,
    S: RecordStore + 'static,
{
    /// Creates a new sync engine.
    pub fn new(config: EngineConfig, source: R, store: S) -> Self {
        Self {
            config,
            source: Arc::new(source),
            store: Arc::new(store),
            cycle_lock: tokio::sync::Mutex::new(()),
            is_running: AtomicBool::new(false),
            loop_active: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            stop_notify: tokio::sync::Notify::new(),
            loop_handle: parking_lot::Mutex::new(None),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The remote entity source this engine drives.
    pub fn source_ref(&self) -> &R {
        &self.source
    }

    /// The record store this engine writes through.
    pub fn store_ref(&self) -> &S {
        &self.store
    }

    /// Returns true while a cycle is in flight.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Returns true while a continuous loop is active.
    pub fn is_continuous(&self) -> bool {
        self.loop_active.load(Ordering::SeqCst)
    }

    /// Runs one full cycle: a pull pass for every configured kind in
    /// dependency order, then a push pass for every kind.
    ///
    /// Never fails: per-pass errors are captured in the returned outcomes
    /// and in the cursors, and a failure in one kind's pass does not
    /// prevent other kinds from running.
    pub async fn run_cycle(&self) -> SyncCycleResult {
        let _guard = self.cycle_lock.lock().await;
        self.run_cycle_locked().await
    }

    /// Runs one ad-hoc cycle.
    ///
    /// Rejected with [`SyncError::AlreadyRunning`] when a cycle is in
    /// flight and `force` is false. With `force` the call proceeds
    /// regardless: it waits for the in-flight cycle to finish and then
    /// runs, so two cycles never race on the same cursor rows.
    pub async fn trigger_manual(&self, force: bool) -> SyncResult<SyncCycleResult> {
        match self.cycle_lock.try_lock() {
            Ok(_guard) => {
                info!(namespace = %self.config.namespace, "manual sync triggered");
                Ok(self.run_cycle_locked().await)
            }
            Err(_) if force => {
                warn!(
                    namespace = %self.config.namespace,
                    "manual sync forced while a cycle is in flight; waiting for it to finish"
                );
                let _guard = self.cycle_lock.lock().await;
                Ok(self.run_cycle_locked().await)
            }
            Err(_) => Err(SyncError::AlreadyRunning),
        }
    }

    /// Starts the continuous loop: run a cycle, idle `interval`, repeat
    /// until [`stop_continuous`](Self::stop_continuous) is called.
    ///
    /// Returns [`SyncError::AlreadyRunning`] if a loop is already active.
    pub fn start_continuous(self: &Arc<Self>, interval: Duration) -> SyncResult<()> {
        if self
            .loop_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        self.stop_requested.store(false, Ordering::SeqCst);

        info!(
            namespace = %self.config.namespace,
            interval_secs = interval.as_secs_f64(),
            "continuous sync started"
        );
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move { engine.continuous_loop(interval).await });
        *self.loop_handle.lock() = Some(handle);
        Ok(())
    }

    /// Requests cancellation of the continuous loop.
    ///
    /// Cooperative: the flag is observed between cycles only, so an
    /// in-flight cycle always completes before shutdown takes effect.
    pub fn stop_continuous(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        // Wake the loop out of its idle sleep; the permit survives even if
        // the loop is mid-cycle and not waiting yet.
        self.stop_notify.notify_one();
        info!(namespace = %self.config.namespace, "continuous sync stop requested");
    }

    /// Waits for a previously started continuous loop to exit.
    pub async fn join_continuous(&self) {
        let handle = self.loop_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Control-surface snapshot: running flags plus the true last-known
    /// cursor per kind, including errors with messages.
    pub async fn status(&self) -> SyncResult<EngineStatus> {
        let mut cursors = BTreeMap::new();
        for kind in &self.config.kinds {
            if let Some(cursor) = self.store.get_cursor(&self.config.namespace, *kind).await? {
                cursors.insert(*kind, cursor);
            }
        }
        Ok(EngineStatus {
            is_running: self.is_running(),
            continuous: self.is_continuous(),
            cursors,
        })
    }

    /// Read-through to the record store for the control surface, which is
    /// not allowed to touch record state directly.
    pub async fn records(
        &self,
        kind: EntityKind,
        filter: RecordFilter,
    ) -> SyncResult<Vec<SyncRecord>> {
        self.store.query(&self.config.namespace, kind, filter).await
    }

    async fn continuous_loop(self: Arc<Self>, interval: Duration) {
        loop {
            let result = self.run_cycle().await;
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            // A cycle in which every pass failed usually means a collaborator
            // is down; reprobe on the shorter backoff so recovery is prompt.
            // The loop itself never dies.
            let idle = if result.all_failed() {
                warn!(
                    namespace = %self.config.namespace,
                    backoff_secs = self.config.error_backoff.as_secs_f64(),
                    "every pass in the cycle failed; backing off"
                );
                self.config.error_backoff
            } else {
                interval
            };

            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = self.stop_notify.notified() => {}
            }
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }
        }

        self.loop_active.store(false, Ordering::SeqCst);
        info!(namespace = %self.config.namespace, "continuous sync stopped");
    }

    async fn run_cycle_locked(&self) -> SyncCycleResult {
        self.is_running.store(true, Ordering::SeqCst);
        let started_at = Utc::now();
        info!(namespace = %self.config.namespace, "sync cycle started");

        let mut outcomes = Vec::with_capacity(self.config.kinds.len() * 2);
        for kind in &self.config.kinds {
            outcomes.push(self.pull_pass(*kind).await);
        }
        for kind in &self.config.kinds {
            outcomes.push(self.push_pass(*kind).await);
        }

        let result = SyncCycleResult {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            namespace = %self.config.namespace,
            processed = result.records_processed(),
            success = result.succeeded(),
            "sync cycle finished"
        );
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    /// One pull pass: plan the window, mark the cursor syncing, fetch,
    /// upsert, and advance the cursor on full success.
    async fn pull_pass(&self, kind: EntityKind) -> PassOutcome {
        let started_at = Utc::now();
        let namespace = &self.config.namespace;
        debug!(namespace = %namespace, kind = %kind, "pull pass started");

        let mut cursor = match self.store.get_cursor(namespace, kind).await {
            Ok(Some(cursor)) => cursor,
            Ok(None) => SyncCursor::new(started_at),
            Err(e) => {
                return self.pass_failed(
                    kind,
                    PassDirection::Pull,
                    started_at,
                    0,
                    format!("failed to load cursor: {e}"),
                )
            }
        };

        // Window is planned from the cursor as it stood before this pass,
        // so an abort below retries exactly the same window next cycle.
        let window = FetchWindow::from_cursor(Some(&cursor));

        // Durable before any remote call: a crash mid-pass is observable on
        // restart as a cursor stuck in `syncing`.
        cursor.begin_pass(Utc::now());
        if let Err(e) = self.store.set_cursor(namespace, kind, cursor.clone()).await {
            return self.pass_failed(
                kind,
                PassDirection::Pull,
                started_at,
                0,
                format!("failed to mark cursor syncing: {e}"),
            );
        }

        let entities = match self
            .source
            .fetch(kind, window, self.config.page_size)
            .await
        {
            Ok(entities) => entities,
            Err(e) => {
                let message = e.to_string();
                self.record_cursor_failure(kind, &mut cursor, &message).await;
                return self.pass_failed(kind, PassDirection::Pull, started_at, 0, message);
            }
        };

        let now = Utc::now();
        let upper_bound = window_upper_bound(&entities, now);

        if entities.is_empty() {
            // An empty diff is a successful sync, not a no-op.
            cursor.complete(upper_bound, now);
            if let Err(e) = self.store.set_cursor(namespace, kind, cursor).await {
                return self.pass_failed(
                    kind,
                    PassDirection::Pull,
                    started_at,
                    0,
                    format!("failed to advance cursor: {e}"),
                );
            }
            debug!(kind = %kind, "pull pass found no modified entities");
            return self.pass_succeeded(kind, PassDirection::Pull, started_at, 0);
        }

        let total = entities.len();
        let records: Vec<SyncRecord> = entities
            .iter()
            .map(|entity| SyncRecord::from_remote(entity, now))
            .collect();

        let upserts = match self.store.upsert_batch(namespace, kind, records).await {
            Ok(upserts) => upserts,
            Err(e) => {
                let message = format!("failed to upsert batch: {e}");
                self.record_cursor_failure(kind, &mut cursor, &message).await;
                return self.pass_failed(kind, PassDirection::Pull, started_at, 0, message);
            }
        };

        let failed = upserts.iter().filter(|o| !o.is_success()).count();
        if failed == 0 {
            cursor.complete(upper_bound, Utc::now());
            if let Err(e) = self.store.set_cursor(namespace, kind, cursor).await {
                return self.pass_failed(
                    kind,
                    PassDirection::Pull,
                    started_at,
                    total as u64,
                    format!("failed to advance cursor: {e}"),
                );
            }
            info!(kind = %kind, count = total, "pull pass synced entities");
            self.pass_succeeded(kind, PassDirection::Pull, started_at, total as u64)
        } else {
            // Already-written records stay put; the unadvanced window makes
            // the retry re-upsert them harmlessly next cycle.
            let message = format!("{failed} of {total} records failed to upsert");
            self.record_cursor_failure(kind, &mut cursor, &message).await;
            self.pass_failed(
                kind,
                PassDirection::Pull,
                started_at,
                (total - failed) as u64,
                message,
            )
        }
    }

    /// One push pass: reconcile pending local records back to the remote
    /// platform, one record at a time.
    async fn push_pass(&self, kind: EntityKind) -> PassOutcome {
        let started_at = Utc::now();
        let namespace = &self.config.namespace;
        debug!(namespace = %namespace, kind = %kind, "push pass started");

        let pending = match self
            .store
            .query(namespace, kind, RecordFilter::pending_local())
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                return self.pass_failed(
                    kind,
                    PassDirection::Push,
                    started_at,
                    0,
                    format!("failed to query pending records: {e}"),
                )
            }
        };

        if pending.is_empty() {
            return self.pass_succeeded(kind, PassDirection::Push, started_at, 0);
        }

        let total = pending.len();
        let mut pushed = 0u64;
        let mut failures = 0usize;

        for mut record in pending {
            let remote_result = match record.remote_id.clone() {
                Some(remote_id) => self.source.update(kind, &remote_id, &record.payload).await,
                None => match self.source.create(kind, &record.payload).await {
                    Ok(remote_id) => {
                        record.remote_id = Some(remote_id);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
            };

            // One bad record must not starve its siblings: failures are
            // written back per record and the loop moves on.
            let mut record_ok = match remote_result {
                Ok(()) => {
                    record.mark_synced(Utc::now());
                    true
                }
                Err(e) => {
                    warn!(
                        kind = %kind,
                        key = %record.upsert_key(),
                        error = %e,
                        "push failed for record"
                    );
                    record.mark_error(e.to_string(), Utc::now());
                    false
                }
            };

            // The captured remote id and the synced transition persist in
            // the same write, before the next record is attempted. A crash
            // between the remote create and this write can duplicate the
            // remote entity on retry; the platform offers no idempotency
            // token for creates.
            match self.store.upsert_batch(namespace, kind, vec![record]).await {
                Ok(upserts) => {
                    if let Some(error) = upserts.first().and_then(|o| o.error.clone()) {
                        error!(kind = %kind, error = %error, "failed to persist pushed record");
                        record_ok = false;
                    }
                }
                Err(e) => {
                    error!(kind = %kind, error = %e, "failed to persist pushed record");
                    record_ok = false;
                }
            }

            if record_ok {
                pushed += 1;
            } else {
                failures += 1;
            }
        }

        if failures == 0 {
            info!(kind = %kind, count = pushed, "push pass reconciled records");
            self.pass_succeeded(kind, PassDirection::Push, started_at, pushed)
        } else {
            let message = format!("{failures} of {total} records failed to push");
            self.pass_failed(kind, PassDirection::Push, started_at, pushed, message)
        }
    }

    async fn record_cursor_failure(&self, kind: EntityKind, cursor: &mut SyncCursor, message: &str) {
        cursor.fail(message, Utc::now());
        if let Err(e) = self
            .store
            .set_cursor(&self.config.namespace, kind, cursor.clone())
            .await
        {
            error!(kind = %kind, error = %e, "failed to record cursor failure");
        }
    }

    fn pass_succeeded(
        &self,
        kind: EntityKind,
        direction: PassDirection,
        started_at: chrono::DateTime<Utc>,
        records_processed: u64,
    ) -> PassOutcome {
        PassOutcome {
            kind,
            direction,
            status: PassStatus::Success,
            records_processed,
            error_message: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn pass_failed(
        &self,
        kind: EntityKind,
        direction: PassDirection,
        started_at: chrono::DateTime<Utc>,
        records_processed: u64,
        message: String,
    ) -> PassOutcome {
        warn!(
            kind = %kind,
            direction = direction.as_str(),
            error = %message,
            "sync pass failed"
        );
        PassOutcome {
            kind,
            direction,
            status: PassStatus::Error,
            records_processed,
            error_message: Some(message),
            started_at,
            finished_at: Utc::now(),
        }
    }
}
