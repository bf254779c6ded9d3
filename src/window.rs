//! Inclusive calendar-day date windows.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

/// An optional `[since, until]` range of calendar days (UTC), both ends inclusive.
/// A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self { since, until }
    }

    /// The window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.since.map_or(true, |s| date >= s) && self.until.map_or(true, |u| date <= u)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.contains_date(ts.date_naive())
    }

    /// Half-open instant bounds `[start, end)` equivalent to this window.
    pub fn instant_bounds(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let start = self.since.map(|d| d.and_time(NaiveTime::MIN));
        let end = self
            .until
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(|d| d.and_time(NaiveTime::MIN));
        (start, end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.since, self.until) {
            (Some(s), Some(u)) => write!(f, "Period from {s} to {u}."),
            (Some(s), None) => write!(f, "Period from {s} to present."),
            (None, Some(u)) => write!(f, "Period ending {u}."),
            (None, None) => f.write_str("All recorded activity."),
        }
    }
}
