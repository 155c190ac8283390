//! Continuous sync command.

use fieldsync_engine::{RecordStore, RemoteEntitySource, SyncEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs continuous sync until Ctrl-C, letting any in-flight cycle finish.
pub async fn execute<R, S>(
    engine: &Arc<SyncEngine<R, S>>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: RemoteEntitySource + 'static,
    S: RecordStore + 'static,
{
    engine.start_continuous(interval)?;
    info!("continuous sync running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    engine.stop_continuous();
    engine.join_continuous().await;
    Ok(())
}
