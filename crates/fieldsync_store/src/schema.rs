//! Table provisioning.

use rusqlite::Connection;

/// Creates the warehouse tables if they do not exist yet.
pub(crate) fn provision(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sync_records (
            local_id             TEXT PRIMARY KEY,
            namespace            TEXT NOT NULL,
            kind                 TEXT NOT NULL,
            record_key           TEXT NOT NULL,
            remote_id            TEXT,
            origin               TEXT NOT NULL,
            state                TEXT NOT NULL,
            payload              TEXT NOT NULL,
            last_modified_remote TEXT,
            last_modified_local  TEXT NOT NULL,
            error_message        TEXT,
            UNIQUE (namespace, kind, record_key)
        );

        CREATE INDEX IF NOT EXISTS idx_sync_records_selection
            ON sync_records (namespace, kind, state, origin);

        CREATE TABLE IF NOT EXISTS sync_cursors (
            namespace           TEXT NOT NULL,
            kind                TEXT NOT NULL,
            last_sync_timestamp TEXT,
            last_status         TEXT NOT NULL,
            last_error          TEXT,
            updated_at          TEXT NOT NULL,
            PRIMARY KEY (namespace, kind)
        );
        ",
    )
}
