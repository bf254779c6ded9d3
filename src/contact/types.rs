//! Message record types.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for `received_at`. Lexicographic order equals time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored visitor message, matching the `messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned, strictly increasing in insertion order.
    pub id: i64,
    /// UTC receipt time, whole seconds.
    pub received_at: DateTime<Utc>,
    /// The decoded message text exactly as submitted.
    pub body: String,
    /// `REMOTE_ADDR` forwarded by the capsule server. Advisory only.
    pub client_address: Option<String>,
    /// The part of the request path the server mapped to this application.
    pub script_path: Option<String>,
    /// The remainder of the request path after `script_path`.
    pub path_info: Option<String>,
    /// Hash of the visitor's TLS client certificate, if one was presented.
    pub tls_client_hash: Option<String>,
    pub read: bool,
}

/// Fields supplied by the submitter of a new message. Everything else is
/// assigned by the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewMessage<'a> {
    pub body: &'a str,
    pub client_address: Option<&'a str>,
    pub script_path: Option<&'a str>,
    pub path_info: Option<&'a str>,
    pub tls_client_hash: Option<&'a str>,
}

impl<'a> NewMessage<'a> {
    pub fn new(body: &'a str) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }

    pub fn with_client_address(mut self, addr: Option<&'a str>) -> Self {
        self.client_address = addr;
        self
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_naive(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> chrono::ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}
