//! Fieldsync CLI
//!
//! Operator entry point for the field-service sync worker.
//!
//! # Commands
//!
//! - `once` - Run a single sync cycle and print the per-pass report
//! - `run` - Run continuous sync until interrupted
//! - `status` - Print per-kind cursor status
//!
//! Remote platform credentials come from `FSM_*` environment variables;
//! see `fieldsync_remote::RemoteConfig::from_env`.

mod commands;

use clap::{Parser, Subcommand};
use fieldsync_engine::{EngineConfig, SyncEngine};
use fieldsync_remote::{FsmClient, RemoteConfig};
use fieldsync_store::SqliteRecordStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fieldsync command-line sync tools.
#[derive(Parser)]
#[command(name = "fieldsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the warehouse database file
    #[arg(global = true, short, long, default_value = "fieldsync.db")]
    database: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single sync cycle and print the per-pass report
    Once {
        /// Run even if another cycle is in flight
        #[arg(short, long)]
        force: bool,
    },

    /// Run continuous sync until interrupted
    Run {
        /// Seconds between cycles
        #[arg(short, long, default_value = "300")]
        interval: u64,
    },

    /// Print per-kind sync status
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let remote_config = RemoteConfig::from_env()?;
    let source = FsmClient::new(remote_config)?;
    let store = SqliteRecordStore::open(&cli.database)?;
    let engine = Arc::new(SyncEngine::new(EngineConfig::default(), source, store));

    match cli.command {
        Commands::Once { force } => commands::once::execute(&engine, force).await?,
        Commands::Run { interval } => {
            commands::run::execute(&engine, Duration::from_secs(interval)).await?
        }
        Commands::Status { format } => commands::status::execute(&engine, &format).await?,
    }

    Ok(())
}
