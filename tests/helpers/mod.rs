#![allow(dead_code)]

use mollymon::db;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A message store in a fresh temporary directory.
pub struct TempStore {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contact.db");
        drop(db::open_database(&path).unwrap());
        Self { dir, path }
    }

    pub fn open(&self) -> Connection {
        db::open_database(&self.path).unwrap()
    }
}

/// Insert a message with a fixed `received_at`, bypassing the clock.
pub fn insert_at(conn: &Connection, received_at: &str, body: &str, read: bool) {
    conn.execute(
        "INSERT INTO messages (received_at, body, read) VALUES (?1, ?2, ?3)",
        rusqlite::params![received_at, body, read as i64],
    )
    .unwrap();
}

/// Write `contents` to `name` inside `dir`, returning the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub const ACCESS_LOG: &str = "\
2024-02-28T23:59:59Z\t198.51.100.1\t20\tgemini://example.org/
2024-03-01T00:00:01Z\t203.0.113.5\t20\tgemini://example.org/
2024-03-01T08:12:00Z\t203.0.113.5\t20\tgemini://example.org/gemlog/posts/2024-02-29.gmi
2024-03-02T09:00:00Z\t192.0.2.77\t20\tgemini://example.org/gemlog/posts/2024-02-29.gmi
2024-03-02T09:00:05Z\t192.0.2.77\t51\tgemini://example.org/favicon.txt
this line is garbage
2024-03-03T10:30:00Z\t192.0.2.77\t20\tgemini://example.org/gemlog/
2024-03-03T11:00:00Z\t203.0.113.9\t10\tgemini://example.org/contact
2024-03-04T12:00:00Z\t198.51.100.1\t20\tgemini://example.org/remini/feed.gmi
2024-03-31T23:59:59Z\t198.51.100.2\t20\tgemini://example.org/about.gmi
2024-04-01T00:00:00Z\t198.51.100.3\t20\tgemini://example.org/about.gmi
";

pub const ERROR_LOG: &str = "\
2024/02/27 10:00:00 Error accepting connection: too many open files
2024/03/02 09:00:05 Error opening file /srv/gemini/favicon.txt: no such file or directory
2024/03/05 14:22:10 TLS handshake error from 192.0.2.9: EOF
\tgoroutine 7 [running]:
2024/04/02 00:00:00 Error reading request from 198.51.100.3: timeout
";
