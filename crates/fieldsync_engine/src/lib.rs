//! # Fieldsync Engine
//!
//! Bidirectional sync engine between a remote field-service platform and a
//! local warehouse.
//!
//! This crate provides:
//! - Collaborator traits at the two seams: [`RemoteEntitySource`] and
//!   [`RecordStore`], with in-memory test doubles
//! - Incremental fetch window planning from per-kind cursors
//! - Per-kind pull passes and local→remote reconciliation
//! - Cycle orchestration and continuous-loop control
//!
//! ## Architecture
//!
//! Each cycle runs a **pull-then-push** model over every entity kind:
//! 1. Pull remote changes for each kind, in referential dependency order
//! 2. Upsert them into the warehouse keyed by remote id
//! 3. Push pending local changes back to the remote platform
//!
//! Pull runs before push within a cycle, so a pending local edit always
//! wins over a concurrently fetched remote value for the same record.
//!
//! ## Key Invariants
//!
//! - The cursor is marked `syncing` durably before any remote call
//! - A failed pass never advances its cursor (idempotent retry)
//! - Upserts are idempotent by remote key
//! - One record's failure never aborts its siblings
//! - Cycles for one namespace never run concurrently

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod source;
mod store;
mod window;

pub use config::EngineConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use source::{MockRemoteSource, RemoteEntitySource};
pub use store::{MemoryRecordStore, RecordFilter, RecordStore, UpsertOutcome};
pub use window::{window_upper_bound, FetchWindow};
