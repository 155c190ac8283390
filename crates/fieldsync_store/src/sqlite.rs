//! SQLite record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldsync_engine::{RecordFilter, RecordStore, SyncError, SyncResult, UpsertOutcome};
use fieldsync_model::{
    CursorStatus, EntityKind, Namespace, RecordOrigin, RecordState, SyncCursor, SyncRecord,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// A [`RecordStore`] backed by a SQLite database file.
///
/// The connection sits behind a mutex; the engine serializes its own store
/// access per namespace anyway, so contention is not a concern here.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (and provisions) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> SyncResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(store_err)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store, mainly for tests and dry runs.
    pub fn open_in_memory() -> SyncResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> SyncResult<Self> {
        crate::schema::provision(&conn).map_err(store_err)?;
        debug!("record store provisioned");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Deletes one record by its key, returning whether a row was removed.
    ///
    /// Warehouse-side maintenance operation; the engine itself never
    /// deletes records.
    pub fn delete(&self, namespace: &Namespace, kind: EntityKind, key: &str) -> SyncResult<bool> {
        let conn = self.conn.lock();
        let affected = conn
            .execute(
                "DELETE FROM sync_records
                 WHERE namespace = ?1 AND kind = ?2 AND record_key = ?3",
                params![namespace.as_str(), kind.as_str(), key],
            )
            .map_err(store_err)?;
        Ok(affected > 0)
    }

    fn upsert_one(conn: &Connection, namespace: &Namespace, kind: EntityKind, record: &SyncRecord)
        -> SyncResult<Uuid> {
        let key = record.upsert_key();

        // The store's primary key is stable: an existing row under this key
        // keeps its local id across upserts.
        let existing: Option<String> = conn
            .query_row(
                "SELECT local_id FROM sync_records
                 WHERE namespace = ?1 AND kind = ?2 AND record_key = ?3",
                params![namespace.as_str(), kind.as_str(), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?;

        let local_id = match existing {
            Some(id) => Uuid::from_str(&id)
                .map_err(|e| SyncError::store(format!("corrupt local id {id}: {e}")))?,
            None => record.local_id,
        };

        // A local record that just gained its remote id moves to the remote
        // key; no stale row may stay behind under the old one.
        conn.execute(
            "DELETE FROM sync_records WHERE local_id = ?1 AND record_key <> ?2",
            params![local_id.to_string(), key],
        )
        .map_err(store_err)?;

        let payload = serde_json::to_string(&record.payload)
            .map_err(|e| SyncError::store(format!("payload not serializable: {e}")))?;

        conn.execute(
            "INSERT OR REPLACE INTO sync_records (
                local_id, namespace, kind, record_key, remote_id, origin,
                state, payload, last_modified_remote, last_modified_local,
                error_message
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                local_id.to_string(),
                namespace.as_str(),
                kind.as_str(),
                key,
                record.remote_id,
                record.origin.as_str(),
                record.state.as_str(),
                payload,
                record.last_modified_remote.map(|t| t.to_rfc3339()),
                record.last_modified_local.to_rfc3339(),
                record.error_message,
            ],
        )
        .map_err(store_err)?;

        Ok(local_id)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn upsert_batch(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        records: Vec<SyncRecord>,
    ) -> SyncResult<Vec<UpsertOutcome>> {
        let conn = self.conn.lock();

        // One record's failure must not roll back its siblings, so each
        // record is written in its own implicit transaction and failures
        // are captured per record.
        let mut outcomes = Vec::with_capacity(records.len());
        for record in &records {
            let key = record.upsert_key();
            match Self::upsert_one(&conn, namespace, kind, record) {
                Ok(local_id) => outcomes.push(UpsertOutcome {
                    local_id,
                    key,
                    error: None,
                }),
                Err(e) => outcomes.push(UpsertOutcome {
                    local_id: record.local_id,
                    key,
                    error: Some(e.to_string()),
                }),
            }
        }

        Ok(outcomes)
    }

    async fn query(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        filter: RecordFilter,
    ) -> SyncResult<Vec<SyncRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT local_id, remote_id, origin, state, payload,
                        last_modified_remote, last_modified_local, error_message
                 FROM sync_records
                 WHERE namespace = ?1 AND kind = ?2
                   AND (?3 IS NULL OR state = ?3)
                   AND (?4 IS NULL OR origin = ?4)
                 ORDER BY record_key",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(
                params![
                    namespace.as_str(),
                    kind.as_str(),
                    filter.state.map(|s| s.as_str()),
                    filter.origin.map(|o| o.as_str()),
                ],
                |row| {
                    Ok(RawRecord {
                        local_id: row.get(0)?,
                        remote_id: row.get(1)?,
                        origin: row.get(2)?,
                        state: row.get(3)?,
                        payload: row.get(4)?,
                        last_modified_remote: row.get(5)?,
                        last_modified_local: row.get(6)?,
                        error_message: row.get(7)?,
                    })
                },
            )
            .map_err(store_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(store_err)?.into_record()?);
        }
        Ok(records)
    }

    async fn get_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
    ) -> SyncResult<Option<SyncCursor>> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT last_sync_timestamp, last_status, last_error, updated_at
                 FROM sync_cursors
                 WHERE namespace = ?1 AND kind = ?2",
                params![namespace.as_str(), kind.as_str()],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(store_err)?;

        match raw {
            None => Ok(None),
            Some((last_sync_timestamp, last_status, last_error, updated_at)) => {
                Ok(Some(SyncCursor {
                    last_sync_timestamp: last_sync_timestamp
                        .map(|t| parse_timestamp(&t))
                        .transpose()?,
                    last_status: parse_cursor_status(&last_status)?,
                    last_error,
                    updated_at: parse_timestamp(&updated_at)?,
                }))
            }
        }
    }

    async fn set_cursor(
        &self,
        namespace: &Namespace,
        kind: EntityKind,
        cursor: SyncCursor,
    ) -> SyncResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sync_cursors (
                namespace, kind, last_sync_timestamp, last_status, last_error, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (namespace, kind) DO UPDATE SET
                last_sync_timestamp = excluded.last_sync_timestamp,
                last_status = excluded.last_status,
                last_error = excluded.last_error,
                updated_at = excluded.updated_at",
            params![
                namespace.as_str(),
                kind.as_str(),
                cursor.last_sync_timestamp.map(|t| t.to_rfc3339()),
                cursor.last_status.as_str(),
                cursor.last_error,
                cursor.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }
}

/// Row image before type conversion.
struct RawRecord {
    local_id: String,
    remote_id: Option<String>,
    origin: String,
    state: String,
    payload: String,
    last_modified_remote: Option<String>,
    last_modified_local: String,
    error_message: Option<String>,
}

impl RawRecord {
    fn into_record(self) -> SyncResult<SyncRecord> {
        Ok(SyncRecord {
            local_id: Uuid::from_str(&self.local_id)
                .map_err(|e| SyncError::store(format!("corrupt local id: {e}")))?,
            remote_id: self.remote_id,
            origin: parse_origin(&self.origin)?,
            state: parse_state(&self.state)?,
            payload: serde_json::from_str(&self.payload)
                .map_err(|e| SyncError::store(format!("corrupt payload: {e}")))?,
            last_modified_remote: self
                .last_modified_remote
                .map(|t| parse_timestamp(&t))
                .transpose()?,
            last_modified_local: parse_timestamp(&self.last_modified_local)?,
            error_message: self.error_message,
        })
    }
}

fn store_err(e: rusqlite::Error) -> SyncError {
    SyncError::store(e.to_string())
}

fn parse_timestamp(raw: &str) -> SyncResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| SyncError::store(format!("corrupt timestamp {raw}: {e}")))
}

fn parse_origin(raw: &str) -> SyncResult<RecordOrigin> {
    match raw {
        "remote" => Ok(RecordOrigin::Remote),
        "local" => Ok(RecordOrigin::Local),
        other => Err(SyncError::store(format!("unknown record origin {other}"))),
    }
}

fn parse_state(raw: &str) -> SyncResult<RecordState> {
    match raw {
        "pending" => Ok(RecordState::Pending),
        "syncing" => Ok(RecordState::Syncing),
        "synced" => Ok(RecordState::Synced),
        "error" => Ok(RecordState::Error),
        other => Err(SyncError::store(format!("unknown record state {other}"))),
    }
}

fn parse_cursor_status(raw: &str) -> SyncResult<CursorStatus> {
    match raw {
        "idle" => Ok(CursorStatus::Idle),
        "syncing" => Ok(CursorStatus::Syncing),
        "success" => Ok(CursorStatus::Success),
        "error" => Ok(CursorStatus::Error),
        other => Err(SyncError::store(format!("unknown cursor status {other}"))),
    }
}
