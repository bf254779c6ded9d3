//! Molly Brown access log lines.
//!
//! Fields are whitespace separated:
//! `<RFC 3339 time> <client address> <status> [<requested URL>] [<size>]`.
//! Molly Brown itself does not write a size; other servers may.

use chrono::{DateTime, Utc};
use url::Url;

use super::LineFormat;

/// One request from the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub timestamp: DateTime<Utc>,
    pub client_address: String,
    pub status: u16,
    /// The requested URL exactly as logged (may be empty).
    pub request: String,
    pub host: Option<String>,
    /// Path component of the request; `/` for a bare host.
    pub path: String,
    pub query: Option<String>,
    pub size: Option<u64>,
}

pub struct AccessFormat;

impl LineFormat for AccessFormat {
    type Event = AccessEvent;

    fn parse_line(line: &str) -> Option<AccessEvent> {
        let mut fields = line.split_whitespace();

        let timestamp = DateTime::parse_from_rfc3339(fields.next()?)
            .ok()?
            .with_timezone(&Utc);
        let client_address = fields.next()?.to_string();
        let status = fields.next()?.parse::<u16>().ok()?;
        if !(10..=99).contains(&status) {
            return None;
        }
        let request = fields.next().unwrap_or_default().to_string();
        let size = match fields.next() {
            Some(raw) => Some(raw.parse::<u64>().ok()?),
            None => None,
        };
        if fields.next().is_some() {
            return None;
        }

        let (host, path, query) = split_request(&request);
        Some(AccessEvent {
            timestamp,
            client_address,
            status,
            request,
            host,
            path,
            query,
            size,
        })
    }
}

/// Break a requested URL into host, path and query.
fn split_request(request: &str) -> (Option<String>, String, Option<String>) {
    if request.is_empty() {
        return (None, String::new(), None);
    }

    match Url::parse(request) {
        Ok(url) => {
            let path = match url.path() {
                "" => "/".to_string(),
                p => p.to_string(),
            };
            (
                url.host_str().map(str::to_string),
                path,
                url.query().map(str::to_string),
            )
        }
        // Relative or otherwise unparseable requests: best-effort split.
        Err(_) => {
            let without_fragment = request.split('#').next().unwrap_or_default();
            match without_fragment.split_once('?') {
                Some((path, query)) => (None, path.to_string(), Some(query.to_string())),
                None => (None, without_fragment.to_string(), None),
            }
        }
    }
}
