//! Plain-text listing and counting of stored messages.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::io::Write;
use std::path::Path;

use super::query::{count_messages, list_messages, MessageFilter};
use super::store::mark_read;
use super::types::{format_timestamp, Message};
use crate::db;
use crate::error::StoreError;

/// Open an existing store for listing or counting. Read-only unless the
/// listed messages are to be marked read; never creates a store.
pub fn open_store(path: &Path, for_marking: bool) -> Result<Connection, StoreError> {
    if !for_marking {
        return db::open_read_only(path);
    }
    if !path.exists() {
        return Err(StoreError::unavailable(path, "no such file"));
    }
    db::open_database(path)
}

/// Write one line per message to `out`. With `mark_read`, exactly the listed
/// messages are marked read, and only after every line was written.
///
/// Returns the number of messages listed.
pub fn print_messages<W: Write>(
    conn: &mut Connection,
    out: &mut W,
    unread_only: bool,
    mark_read_after: bool,
) -> Result<usize> {
    let filter = MessageFilter::default().with_unread_only(unread_only);
    let messages = list_messages(conn, &filter).context("failed to list messages")?;

    for message in &messages {
        writeln!(out, "{}", format_message_line(message))?;
    }
    out.flush()?;

    if mark_read_after && !messages.is_empty() {
        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        mark_read(conn, &ids).context("failed to mark messages read")?;
    }

    Ok(messages.len())
}

/// Write the number of matching messages as a single integer line.
pub fn print_message_count<W: Write>(conn: &Connection, out: &mut W, unread_only: bool) -> Result<u64> {
    let filter = MessageFilter::default().with_unread_only(unread_only);
    let count = count_messages(conn, &filter).context("failed to count messages")?;
    writeln!(out, "{count}")?;
    Ok(count)
}

/// `<id>\t<received_at> UTC\t<body>[\t<address>]`, with control whitespace in
/// the body escaped so each message stays on one line.
pub fn format_message_line(message: &Message) -> String {
    let mut line = format!(
        "{}\t{} UTC\t{}",
        message.id,
        format_timestamp(&message.received_at),
        escape_body(&message.body)
    );
    if let Some(addr) = &message.client_address {
        line.push('\t');
        line.push_str(addr);
    }
    line
}

fn escape_body(body: &str) -> String {
    let mut escaped = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}
