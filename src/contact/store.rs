//! Write path: inserting messages and marking them read.

use chrono::{SubsecRound, Utc};
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};

use super::types::{format_timestamp, Message, NewMessage};
use crate::error::StoreError;

/// Maximum ids bound in one `UPDATE ... IN (...)` statement.
const MARK_READ_CHUNK: usize = 500;

/// Append a new message. The id and `received_at` are assigned here.
///
/// The insert runs in an immediate transaction, so concurrent writers (threads
/// or processes) are serialized by SQLite and never share an id.
pub fn insert_message(conn: &mut Connection, new: &NewMessage<'_>) -> Result<Message, StoreError> {
    let received_at = Utc::now().trunc_subsecs(0);

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO messages (received_at, body, client_address, script_path, path_info, tls_client_hash, read) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        params![
            format_timestamp(&received_at),
            new.body,
            new.client_address,
            new.script_path,
            new.path_info,
            new.tls_client_hash,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::debug!(id, body_len = new.body.len(), "message stored");

    Ok(Message {
        id,
        received_at,
        body: new.body.to_string(),
        client_address: new.client_address.map(str::to_string),
        script_path: new.script_path.map(str::to_string),
        path_info: new.path_info.map(str::to_string),
        tls_client_hash: new.tls_client_hash.map(str::to_string),
        read: false,
    })
}

/// Mark the given messages read. Idempotent; unknown ids are ignored.
///
/// Returns the number of messages that changed from unread to read.
pub fn mark_read(conn: &mut Connection, ids: &[i64]) -> Result<usize, StoreError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut changed = 0;
    for chunk in ids.chunks(MARK_READ_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        changed += tx.execute(
            &format!("UPDATE messages SET read = 1 WHERE read = 0 AND id IN ({placeholders})"),
            params_from_iter(chunk.iter()),
        )?;
    }
    tx.commit()?;

    tracing::debug!(requested = ids.len(), changed, "messages marked read");
    Ok(changed)
}
