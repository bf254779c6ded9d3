//! Lazy, line-oriented parsing of capsule server logs.
//!
//! [`parse_access`] and [`parse_error`] open a log file and return a
//! single-pass iterator of events. Lines that do not fit the expected shape
//! are skipped and counted (see [`LogEvents::unparsed`]); only I/O failures
//! surface as errors.

pub mod access;
pub mod error;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::LogError;
pub use access::{AccessEvent, AccessFormat};
pub use error::{ErrorEvent, ErrorFormat};

/// The shape of one kind of log line.
pub trait LineFormat {
    type Event;

    /// Parse one line (without its terminator). `None` means malformed.
    fn parse_line(line: &str) -> Option<Self::Event>;
}

/// Forward-only iterator over the events of one log file.
pub struct LogEvents<F: LineFormat, R = BufReader<File>> {
    source: PathBuf,
    reader: R,
    buf: Vec<u8>,
    parsed: usize,
    unparsed: usize,
    done: bool,
    _format: PhantomData<F>,
}

/// Open an access log for parsing.
pub fn parse_access(path: impl AsRef<Path>) -> Result<LogEvents<AccessFormat>, LogError> {
    LogEvents::open(path)
}

/// Open an error log for parsing.
pub fn parse_error(path: impl AsRef<Path>) -> Result<LogEvents<ErrorFormat>, LogError> {
    LogEvents::open(path)
}

impl<F: LineFormat> LogEvents<F> {
    /// Open `path`. A missing file is [`LogError::NotFound`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LogError::NotFound(path.to_path_buf()),
            _ => LogError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        tracing::debug!(path = %path.display(), "parsing log");
        Ok(Self::from_reader(path, BufReader::new(file)))
    }
}

impl<F: LineFormat, R: BufRead> LogEvents<F, R> {
    /// Parse from any buffered reader; `source` is only used in errors.
    pub fn from_reader(source: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            source: source.into(),
            reader,
            buf: Vec::new(),
            parsed: 0,
            unparsed: 0,
            done: false,
            _format: PhantomData,
        }
    }

    /// Events yielded so far.
    pub fn parsed(&self) -> usize {
        self.parsed
    }

    /// Non-blank lines skipped as malformed so far.
    pub fn unparsed(&self) -> usize {
        self.unparsed
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl<F: LineFormat, R: BufRead> Iterator for LogEvents<F, R> {
    type Item = Result<F::Event, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() {
                        continue;
                    }
                    match F::parse_line(line) {
                        Some(event) => {
                            self.parsed += 1;
                            return Some(Ok(event));
                        }
                        None => {
                            tracing::debug!(source = %self.source.display(), line, "unparsed log line");
                            self.unparsed += 1;
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(LogError::Read {
                        path: self.source.clone(),
                        source: e,
                    }));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Digits;

    impl LineFormat for Digits {
        type Event = u32;

        fn parse_line(line: &str) -> Option<u32> {
            line.parse().ok()
        }
    }

    #[test]
    fn skips_and_counts_malformed_lines() {
        let input = "1\n2\nnope\n\n3\r\n";
        let mut events = LogEvents::<Digits, _>::from_reader("mem", Cursor::new(input));

        let values: Vec<u32> = events.by_ref().map(Result::unwrap).collect();

        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(events.parsed(), 3);
        assert_eq!(events.unparsed(), 1);
    }

    #[test]
    fn last_line_without_newline_is_parsed() {
        let events = LogEvents::<Digits, _>::from_reader("mem", Cursor::new("4\n5"));
        let values: Vec<u32> = events.map(Result::unwrap).collect();
        assert_eq!(values, vec![4, 5]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = parse_access(tmp.path().join("access.log")).err().unwrap();
        assert!(matches!(err, LogError::NotFound(_)));
    }
}
