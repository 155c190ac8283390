//! # Fieldsync Store
//!
//! SQLite-backed implementation of the engine's [`RecordStore`] contract:
//! a `sync_records` table keyed by (namespace, kind, record key) plus the
//! `sync_cursors` bookmark table. Schema is provisioned when the store is
//! opened.
//!
//! Upserts are idempotent by record key. Within a batch each record is
//! written independently: a failing record is reported in its
//! [`UpsertOutcome`] and already-written siblings stay put.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod schema;
mod sqlite;

pub use sqlite::SqliteRecordStore;
