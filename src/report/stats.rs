//! Aggregates computed over parsed log events.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::logstats::{AccessEvent, ErrorEvent};

/// A path and how many requests hit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCount {
    pub path: String,
    pub hits: u64,
}

/// Counts keyed by string, remembering first-seen order for tie-breaking.
#[derive(Debug, Default)]
pub(crate) struct FrequencyCounter {
    index: HashMap<String, usize>,
    entries: Vec<PathCount>,
}

impl FrequencyCounter {
    pub(crate) fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].hits += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(PathCount {
                    path: key.to_string(),
                    hits: 1,
                });
            }
        }
    }

    /// The `n` most frequent keys; equal counts keep first-seen order.
    pub(crate) fn top(mut self, n: usize) -> Vec<PathCount> {
        // sort_by is stable
        self.entries.sort_by(|a, b| b.hits.cmp(&a.hits));
        self.entries.truncate(n);
        self.entries
    }
}

/// The traffic section of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficStats {
    pub total_requests: u64,
    pub unique_clients: u64,
    /// Status code histogram, ascending by code.
    pub status_counts: BTreeMap<u16, u64>,
    pub top_paths: Vec<PathCount>,
    pub unparsed_lines: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TrafficAccumulator {
    total: u64,
    clients: HashSet<String>,
    statuses: BTreeMap<u16, u64>,
    paths: FrequencyCounter,
}

impl TrafficAccumulator {
    pub(crate) fn record(&mut self, event: &AccessEvent) {
        self.total += 1;
        if !self.clients.contains(&event.client_address) {
            self.clients.insert(event.client_address.clone());
        }
        *self.statuses.entry(event.status).or_insert(0) += 1;
        if !event.path.is_empty() {
            self.paths.add(&event.path);
        }
    }

    pub(crate) fn finish(self, top_n: usize, unparsed_lines: usize) -> TrafficStats {
        TrafficStats {
            total_requests: self.total,
            unique_clients: self.clients.len() as u64,
            status_counts: self.statuses,
            top_paths: self.paths.top(top_n),
            unparsed_lines,
        }
    }
}

/// Successful traffic under one path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionStats {
    pub title: String,
    pub prefix: String,
    pub visits: u64,
    pub unique_clients: u64,
    pub top_paths: Vec<PathCount>,
}

#[derive(Debug)]
pub(crate) struct SectionAccumulator {
    title: String,
    prefix: String,
    visits: u64,
    clients: HashSet<String>,
    paths: FrequencyCounter,
}

impl SectionAccumulator {
    pub(crate) fn new(title: &str, prefix: &str) -> Self {
        Self {
            title: title.to_string(),
            prefix: prefix.to_string(),
            visits: 0,
            clients: HashSet::new(),
            paths: FrequencyCounter::default(),
        }
    }

    pub(crate) fn record(&mut self, event: &AccessEvent) {
        if event.status != 20 || !event.path.starts_with(&self.prefix) {
            return;
        }
        self.visits += 1;
        self.clients.insert(event.client_address.clone());
        self.paths.add(&event.path);
    }

    pub(crate) fn finish(self, top_n: usize) -> SectionStats {
        SectionStats {
            title: self.title,
            prefix: self.prefix,
            visits: self.visits,
            unique_clients: self.clients.len() as u64,
            top_paths: self.paths.top(top_n),
        }
    }
}

/// The errors section of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorStats {
    pub total_errors: u64,
    /// The most recent errors in the window, oldest first.
    pub sample: Vec<ErrorEvent>,
    pub unparsed_lines: usize,
}

#[derive(Debug)]
pub(crate) struct ErrorAccumulator {
    total: u64,
    limit: usize,
    recent: VecDeque<ErrorEvent>,
}

impl ErrorAccumulator {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            total: 0,
            limit,
            recent: VecDeque::with_capacity(limit.min(64)),
        }
    }

    pub(crate) fn record(&mut self, event: ErrorEvent) {
        self.total += 1;
        if self.limit == 0 {
            return;
        }
        if self.recent.len() == self.limit {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    pub(crate) fn finish(self, unparsed_lines: usize) -> ErrorStats {
        ErrorStats {
            total_errors: self.total,
            sample: self.recent.into(),
            unparsed_lines,
        }
    }
}

/// Message counts within the report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStats {
    pub total: u64,
    pub unread: u64,
}
