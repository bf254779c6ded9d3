//! Molly Brown error log lines: `<date> <time> <message...>` as written by
//! Go's standard logger. Naive timestamps are taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::LineFormat;

const NAIVE_FORMATS: [&str; 2] = ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// One entry from the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

pub struct ErrorFormat;

impl LineFormat for ErrorFormat {
    type Event = ErrorEvent;

    fn parse_line(line: &str) -> Option<ErrorEvent> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (timestamp, rest) = parse_leading_timestamp(&tokens)?;
        Some(ErrorEvent {
            timestamp,
            message: rest.join(" "),
        })
    }
}

fn parse_leading_timestamp<'a, 'b>(tokens: &'b [&'a str]) -> Option<(DateTime<Utc>, &'b [&'a str])> {
    if tokens.len() >= 2 {
        let date_time = format!("{} {}", tokens[0], tokens[1]);
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&date_time, format) {
                return Some((naive.and_utc(), &tokens[2..]));
            }
        }
    }

    let first = tokens.first()?;
    DateTime::parse_from_rfc3339(first)
        .ok()
        .map(|ts| (ts.with_timezone(&Utc), &tokens[1..]))
}
