//! CLI `report` command: print the activity report to stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use std::path::PathBuf;

use mollymon::config::MollymonConfig;
use mollymon::report::{generate_report, ReportRequest};
use mollymon::window::DateWindow;

/// Command-line overrides for the `[report]` config section.
pub struct ReportArgs {
    pub access_log: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    pub capsule: Option<String>,
    pub db_file: Option<PathBuf>,
    pub no_messages: bool,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

pub fn report(config: &MollymonConfig, args: ReportArgs) -> Result<()> {
    if let (Some(since), Some(until)) = (args.since, args.until) {
        anyhow::ensure!(since <= until, "--since {since} is after --until {until}");
    }

    let mut request =
        ReportRequest::from_config(&config.report, DateWindow::new(args.since, args.until));
    if let Some(path) = args.access_log {
        request.access_log = path;
    }
    if let Some(path) = args.error_log {
        request.error_log = path;
    }
    if let Some(name) = args.capsule {
        request.capsule_name = name;
    }
    if !args.no_messages {
        request = request.with_store(args.db_file.unwrap_or_else(|| config.resolved_db_path()));
    }

    let report = generate_report(&request).context("failed to generate report")?;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{report}")?;
    stdout.flush()?;
    Ok(())
}
