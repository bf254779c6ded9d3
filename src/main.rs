mod cli;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use mollymon::config::MollymonConfig;

#[derive(Parser)]
#[command(name = "mollymon", version, about = "Companion tools for a Molly Brown Gemini capsule")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Leave and read visitor messages
    Contact {
        /// Message database file
        #[arg(long)]
        db_file: Option<PathBuf>,

        #[command(subcommand)]
        action: ContactAction,
    },
    /// Print an activity report built from the capsule logs
    Report {
        #[arg(long)]
        access_log: Option<PathBuf>,
        #[arg(long)]
        error_log: Option<PathBuf>,
        /// Capsule name for the report header
        #[arg(long)]
        capsule: Option<String>,
        /// Message database file to count messages from
        #[arg(long)]
        db_file: Option<PathBuf>,
        /// Leave the messages section out
        #[arg(long)]
        no_messages: bool,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ContactAction {
    /// Run the SCGI application
    Run {
        /// Where to create the socket file
        #[arg(long)]
        sock_file: Option<PathBuf>,
    },
    /// Print messages, one per line
    Print {
        /// Print unread messages only
        #[arg(long)]
        unread: bool,
        /// Mark the printed messages as read
        #[arg(long)]
        mark_read: bool,
    },
    /// Print the number of messages
    Count {
        /// Count unread messages only
        #[arg(long)]
        unread: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MollymonConfig::load_from(path)?,
        None => MollymonConfig::load()?,
    };
    if cli.debug {
        config.logging.level = "debug".into();
    }
    init_logging(&config.logging.level, cli.log_file.as_deref())?;

    match cli.command {
        Command::Contact { db_file, action } => {
            if let Some(db_file) = db_file {
                config.contact.db_path = db_file.to_string_lossy().into_owned();
            }
            match action {
                ContactAction::Run { sock_file } => {
                    if let Some(sock_file) = sock_file {
                        config.contact.socket_path = sock_file.to_string_lossy().into_owned();
                    }
                    cli::contact::run(&config).await?;
                }
                ContactAction::Print { unread, mark_read } => {
                    cli::contact::print(&config, unread, mark_read)?;
                }
                ContactAction::Count { unread } => {
                    cli::contact::count(&config, unread)?;
                }
            }
        }
        Command::Report {
            access_log,
            error_log,
            capsule,
            db_file,
            no_messages,
            since,
            until,
        } => {
            let args = cli::report::ReportArgs {
                access_log,
                error_log,
                capsule,
                db_file,
                no_messages,
                since,
                until,
            };
            cli::report::report(&config, args)?;
        }
    }

    Ok(())
}

/// Logs go to stderr (or a file) so stdout stays clean for reports and listings.
fn init_logging(level: &str, log_file: Option<&std::path::Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
