//! Read path: filtered listing and counting of messages.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use super::types::{format_naive, parse_timestamp, Message};
use crate::error::StoreError;
use crate::window::DateWindow;

/// Criteria shared by [`list_messages`] and [`count_messages`]. Unset fields
/// do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub unread_only: bool,
    /// Inclusive lower bound on `received_at` (UTC).
    pub since: Option<NaiveDateTime>,
    /// Exclusive upper bound on `received_at` (UTC).
    pub until: Option<NaiveDateTime>,
    pub client_address: Option<String>,
    pub script_path: Option<String>,
}

impl MessageFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Default::default()
        }
    }

    pub fn with_unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }

    /// Restrict to messages received on the calendar days of `window`.
    pub fn within(mut self, window: &DateWindow) -> Self {
        let (start, end) = window.instant_bounds();
        self.since = start;
        self.until = end;
        self
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if self.unread_only {
            clauses.push("read = 0");
        }
        if let Some(since) = &self.since {
            clauses.push("received_at >= ?");
            params.push(Value::Text(format_naive(since)));
        }
        if let Some(until) = &self.until {
            clauses.push("received_at < ?");
            params.push(Value::Text(format_naive(until)));
        }
        if let Some(addr) = &self.client_address {
            clauses.push("client_address = ?");
            params.push(Value::Text(addr.clone()));
        }
        if let Some(script) = &self.script_path {
            clauses.push("script_path = ?");
            params.push(Value::Text(script.clone()));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// List matching messages in insertion (`id`) order.
pub fn list_messages(conn: &Connection, filter: &MessageFilter) -> Result<Vec<Message>, StoreError> {
    let (where_clause, params) = filter.where_clause();
    let sql = format!(
        "SELECT id, received_at, body, client_address, script_path, path_info, tls_client_hash, read \
         FROM messages{where_clause} ORDER BY id ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let messages = stmt
        .query_map(params_from_iter(params), row_to_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Count matching messages without loading them.
pub fn count_messages(conn: &Connection, filter: &MessageFilter) -> Result<u64, StoreError> {
    let (where_clause, params) = filter.where_clause();
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM messages{where_clause}"),
        params_from_iter(params),
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Count messages received within the calendar days of `window`.
pub fn count_in_window(
    conn: &Connection,
    window: &DateWindow,
    unread_only: bool,
) -> Result<u64, StoreError> {
    count_messages(
        conn,
        &MessageFilter::default()
            .with_unread_only(unread_only)
            .within(window),
    )
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let received_at: String = row.get(1)?;
    let received_at = parse_timestamp(&received_at).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Message {
        id: row.get(0)?,
        received_at,
        body: row.get(2)?,
        client_address: row.get(3)?,
        script_path: row.get(4)?,
        path_info: row.get(5)?,
        tls_client_hash: row.get(6)?,
        read: row.get::<_, i64>(7)? != 0,
    })
}
