//! SQL DDL for the message store.
//!
//! Defines the `messages` and `schema_meta` tables at schema version 1. Later
//! versions are reached through [`super::migrations`]. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::{Connection, OptionalExtension};

const SCHEMA_SQL: &str = r#"
-- Visitor messages. AUTOINCREMENT keeps ids strictly increasing, never reused.
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    received_at TEXT NOT NULL,
    body TEXT NOT NULL,
    client_address TEXT,
    script_path TEXT,
    path_info TEXT,
    read INTEGER NOT NULL DEFAULT 0 CHECK(read IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_messages_read ON messages(read);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

/// Whether a table with the given name exists.
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}
