//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::{Connection, OptionalExtension};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database, or `None` if it was never recorded.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
    .optional()
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations in a single transaction.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    migrate(&tx)?;
    tx.commit()
}

/// Bring the schema up to [`CURRENT_SCHEMA_VERSION`] on a connection that is
/// already inside a transaction. The version is read under the same lock that
/// guards the schema changes, so concurrent openers never repeat a step.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?.unwrap_or(0);
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        match next {
            2 => migrate_v1_to_v2(conn)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(conn, next)?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: record the visitor's TLS client certificate hash and index
/// `received_at` for windowed counts.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE messages ADD COLUMN tls_client_hash TEXT;
         CREATE INDEX IF NOT EXISTS idx_messages_received_at ON messages(received_at);",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn columns(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM pragma_table_info('messages')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_db() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(1));
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        assert_eq!(
            get_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn migration_v1_to_v2_adds_tls_client_hash() {
        let mut conn = test_db();
        assert!(!columns(&conn).contains(&"tls_client_hash".to_string()));

        run_migrations(&mut conn).unwrap();

        assert!(columns(&conn).contains(&"tls_client_hash".to_string()));
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap(); // second call should not error
        assert_eq!(
            get_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
