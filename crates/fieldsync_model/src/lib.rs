//! # Fieldsync Model
//!
//! Data model types shared by the fieldsync engine and its collaborators.
//!
//! This crate provides:
//! - `Namespace` and `EntityKind` for addressing synchronizable data
//! - `SyncRecord`, the canonical unit moved between systems
//! - `SyncCursor`, the per-kind incremental-sync bookmark
//! - `PassOutcome` / `SyncCycleResult` for reporting cycle results
//! - `EngineStatus` for control-surface snapshots
//!
//! This is a pure types crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod kind;
mod namespace;
mod outcome;
mod record;

pub use cursor::{CursorStatus, SyncCursor};
pub use kind::{EntityKind, UnknownEntityKind};
pub use namespace::Namespace;
pub use outcome::{EngineStatus, PassDirection, PassOutcome, PassStatus, SyncCycleResult};
pub use record::{RecordOrigin, RecordState, RemoteEntity, SyncRecord};
