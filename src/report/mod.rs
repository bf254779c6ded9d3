//! Activity report: capsule traffic, server errors and visitor messages over a
//! date window.
//!
//! [`generate_report`] reads both logs in full, filters events to the window,
//! aggregates them, and adds message counts when a store is available. The
//! result renders to deterministic plain text via its `Display` impl.

pub mod render;
pub mod stats;

use std::path::{Path, PathBuf};

use crate::config::{ReportConfig, SectionConfig};
use crate::contact::count_in_window;
use crate::error::ReportError;
use crate::logstats::{parse_access, parse_error};
use crate::window::DateWindow;
use stats::{
    ErrorAccumulator, ErrorStats, MessageStats, SectionAccumulator, SectionStats,
    TrafficAccumulator, TrafficStats,
};

/// Everything a report run needs; no ambient state is consulted.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub capsule_name: String,
    pub access_log: PathBuf,
    pub error_log: PathBuf,
    /// Message store to count from. `None`, or a path with no usable store,
    /// omits the messages section.
    pub store_path: Option<PathBuf>,
    pub window: DateWindow,
    pub top_paths: usize,
    pub error_sample: usize,
    pub exclude_prefixes: Vec<String>,
    pub sections: Vec<SectionConfig>,
}

impl ReportRequest {
    pub fn new(
        capsule_name: impl Into<String>,
        access_log: impl Into<PathBuf>,
        error_log: impl Into<PathBuf>,
    ) -> Self {
        Self {
            capsule_name: capsule_name.into(),
            access_log: access_log.into(),
            error_log: error_log.into(),
            store_path: None,
            window: DateWindow::unbounded(),
            top_paths: 10,
            error_sample: 5,
            exclude_prefixes: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Build from the `[report]` config section.
    pub fn from_config(config: &ReportConfig, window: DateWindow) -> Self {
        Self {
            capsule_name: config.capsule_name.clone(),
            access_log: crate::config::expand_tilde(&config.access_log),
            error_log: crate::config::expand_tilde(&config.error_log),
            store_path: None,
            window,
            top_paths: config.top_paths,
            error_sample: config.error_sample,
            exclude_prefixes: config.exclude_prefixes.clone(),
            sections: config.sections.clone(),
        }
    }

    pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// A computed report. Render it with `to_string()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub capsule_name: String,
    pub window: DateWindow,
    pub traffic: TrafficStats,
    pub sections: Vec<SectionStats>,
    pub errors: ErrorStats,
    /// `None` when no message store was available.
    pub messages: Option<MessageStats>,
}

/// Build a report. Fails only if a log cannot be opened or read.
pub fn generate_report(request: &ReportRequest) -> Result<Report, ReportError> {
    // Open both up front so a missing log fails before any work is done.
    let mut access = parse_access(&request.access_log)?;
    let mut errors = parse_error(&request.error_log)?;

    let mut traffic = TrafficAccumulator::default();
    let mut sections: Vec<SectionAccumulator> = request
        .sections
        .iter()
        .map(|s| SectionAccumulator::new(&s.title, &s.prefix))
        .collect();
    for event in access.by_ref() {
        let event = event?;
        if !request.window.contains(event.timestamp) || request.is_excluded(&event.path) {
            continue;
        }
        traffic.record(&event);
        for section in &mut sections {
            section.record(&event);
        }
    }
    tracing::debug!(
        parsed = access.parsed(),
        unparsed = access.unparsed(),
        "access log parsed"
    );

    let mut error_acc = ErrorAccumulator::new(request.error_sample);
    for event in errors.by_ref() {
        let event = event?;
        if request.window.contains(event.timestamp) {
            error_acc.record(event);
        }
    }
    tracing::debug!(
        parsed = errors.parsed(),
        unparsed = errors.unparsed(),
        "error log parsed"
    );

    let messages = request
        .store_path
        .as_deref()
        .and_then(|path| message_stats(path, &request.window));

    Ok(Report {
        capsule_name: request.capsule_name.clone(),
        window: request.window,
        traffic: traffic.finish(request.top_paths, access.unparsed()),
        sections: sections
            .into_iter()
            .map(|s| s.finish(request.top_paths))
            .collect(),
        errors: error_acc.finish(errors.unparsed()),
        messages,
    })
}

/// Message counts for the window, or `None` if the store cannot be used.
fn message_stats(path: &Path, window: &DateWindow) -> Option<MessageStats> {
    let conn = match crate::db::open_read_only(path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "omitting message statistics");
            return None;
        }
    };

    let counts = count_in_window(&conn, window, false)
        .and_then(|total| Ok((total, count_in_window(&conn, window, true)?)));
    match counts {
        Ok((total, unread)) => Some(MessageStats { total, unread }),
        Err(e) => {
            tracing::warn!(error = %e, "omitting message statistics");
            None
        }
    }
}
