//! Single-cycle command.

use fieldsync_engine::{RecordStore, RemoteEntitySource, SyncEngine};
use std::sync::Arc;

/// Runs one cycle and prints the per-pass report.
pub async fn execute<R, S>(
    engine: &Arc<SyncEngine<R, S>>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: RemoteEntitySource + 'static,
    S: RecordStore + 'static,
{
    let result = engine.trigger_manual(force).await?;

    println!(
        "cycle: {} ({} records, {:.1}s)",
        if result.succeeded() { "success" } else { "completed with errors" },
        result.records_processed(),
        (result.finished_at - result.started_at).num_milliseconds() as f64 / 1000.0,
    );
    for outcome in &result.outcomes {
        match &outcome.error_message {
            None => println!(
                "  {:<12} {:<5} ok     {:>6} records",
                outcome.kind.as_str(),
                outcome.direction.as_str(),
                outcome.records_processed,
            ),
            Some(error) => println!(
                "  {:<12} {:<5} error  {:>6} records  {error}",
                outcome.kind.as_str(),
                outcome.direction.as_str(),
                outcome.records_processed,
            ),
        }
    }

    Ok(())
}
