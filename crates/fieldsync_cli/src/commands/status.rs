//! Status command.

use fieldsync_engine::{RecordStore, RemoteEntitySource, SyncEngine};
use std::sync::Arc;

/// Prints the per-kind cursor status.
pub async fn execute<R, S>(
    engine: &Arc<SyncEngine<R, S>>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: RemoteEntitySource + 'static,
    S: RecordStore + 'static,
{
    let status = engine.status().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            println!("running: {}", status.is_running);
            println!("continuous: {}", status.continuous);
            if status.cursors.is_empty() {
                println!("no sync has run yet");
            }
            for (kind, cursor) in &status.cursors {
                let last_sync = cursor
                    .last_sync_timestamp
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".into());
                match &cursor.last_error {
                    None => println!("  {:<12} {:<8} last sync {last_sync}", kind.as_str(), cursor.last_status.as_str()),
                    Some(error) => println!(
                        "  {:<12} {:<8} last sync {last_sync}  {error}",
                        kind.as_str(),
                        cursor.last_status.as_str(),
                    ),
                }
            }
        }
    }

    Ok(())
}
