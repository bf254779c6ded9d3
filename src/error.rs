//! Error taxonomy shared by the contact service and the report engine.
//!
//! Store and log failures are surfaced to the operator; SCGI framing failures
//! never leave the connection they happened on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the SQLite-backed message store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or created, or its schema is not one we understand.
    #[error("message store unavailable at {}: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },

    /// A read or write failed after the store was opened.
    #[error("message store I/O error: {0}")]
    Io(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Unavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures opening or reading a capsule server log file.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read log file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A malformed SCGI request. Contained at the connection boundary.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("invalid netstring length prefix")]
    BadLength,

    #[error("header block of {0} bytes exceeds the configured limit")]
    HeadersTooLarge(usize),

    #[error("header netstring is not terminated by ','")]
    MissingComma,

    #[error("header block is not a sequence of NUL-terminated name/value pairs")]
    MalformedHeaders,

    #[error("required header CONTENT_LENGTH is missing")]
    MissingContentLength,

    #[error("invalid CONTENT_LENGTH: {0:?}")]
    InvalidContentLength(String),

    #[error("body of {0} bytes exceeds the configured limit")]
    BodyTooLarge(usize),

    #[error("connection closed before the request was complete")]
    Truncated,

    #[error("timed out waiting for request bytes")]
    TimedOut,

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Failures that abort a report before any output is produced.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Log(#[from] LogError),
}
