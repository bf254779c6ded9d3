pub mod migrations;
pub mod schema;

use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use crate::error::StoreError;
use migrations::CURRENT_SCHEMA_VERSION;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (or create) the message store at the given path, with the schema
/// initialized and migrated to [`CURRENT_SCHEMA_VERSION`].
///
/// Fails with [`StoreError::Unavailable`] if the path cannot be written or the
/// existing database carries a schema this binary does not understand.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::unavailable(path, format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let mut conn = Connection::open(path).map_err(|e| StoreError::unavailable(path, e))?;

    configure(&conn).map_err(|e| StoreError::unavailable(path, e))?;

    // Check, create and migrate under one write lock so a concurrent opener
    // never sees a half-created schema.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| StoreError::unavailable(path, e))?;
    check_compatible(&tx, path)?;
    schema::init_schema(&tx).map_err(|e| StoreError::unavailable(path, e))?;
    migrations::migrate(&tx).map_err(|e| StoreError::unavailable(path, e))?;
    tx.commit().map_err(|e| StoreError::unavailable(path, e))?;

    tracing::debug!(path = %path.display(), "message store opened");
    Ok(conn)
}

/// Open an existing message store without write access.
///
/// The store must already exist at the current schema version; nothing is
/// created or migrated.
pub fn open_read_only(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StoreError::unavailable(path, "no such file"));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| StoreError::unavailable(path, e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| StoreError::unavailable(path, e))?;

    check_compatible(&conn, path)?;
    let version = migrations::get_schema_version(&conn)
        .map_err(|e| StoreError::unavailable(path, e))?;
    if version != Some(CURRENT_SCHEMA_VERSION) {
        return Err(StoreError::unavailable(
            path,
            format!(
                "schema version {} needs migration to {CURRENT_SCHEMA_VERSION}",
                version.unwrap_or(0)
            ),
        ));
    }

    tracing::debug!(path = %path.display(), "message store opened read-only");
    Ok(conn)
}

/// Open an in-memory store with the full schema. Used by tests.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let mut conn = Connection::open_in_memory()?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // WAL lets the report and print tools read while the service writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

/// Reject databases whose schema we cannot safely touch: a `messages` table
/// without version metadata, or a version newer than this binary.
fn check_compatible(conn: &Connection, path: &Path) -> Result<(), StoreError> {
    let unavailable = |e: rusqlite::Error| StoreError::unavailable(path, e);

    let has_meta = schema::table_exists(conn, "schema_meta").map_err(unavailable)?;
    if !has_meta {
        if schema::table_exists(conn, "messages").map_err(unavailable)? {
            return Err(StoreError::unavailable(
                path,
                "unversioned messages table (incompatible schema)",
            ));
        }
        return Ok(());
    }

    match migrations::get_schema_version(conn).map_err(unavailable)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => Err(StoreError::unavailable(
            path,
            format!("schema version {v} is newer than supported version {CURRENT_SCHEMA_VERSION}"),
        )),
        Some(0) => Err(StoreError::unavailable(path, "unreadable schema version")),
        _ => Ok(()),
    }
}
