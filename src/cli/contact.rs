//! CLI `contact` commands: run the SCGI service, list and count messages.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use mollymon::config::MollymonConfig;
use mollymon::contact::print::{open_store, print_message_count, print_messages};
use mollymon::db;
use mollymon::scgi::{server, ContactService};

/// Serve the contact form until Ctrl-C.
pub async fn run(config: &MollymonConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "message store ready");

    let service = ContactService::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(config.contact.clone()),
    );

    server::run(&config.resolved_socket_path(), service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await
}

pub fn print(config: &MollymonConfig, unread_only: bool, mark_read: bool) -> Result<()> {
    let mut conn = open_store(&config.resolved_db_path(), mark_read)?;
    let mut stdout = std::io::stdout().lock();
    let listed = print_messages(&mut conn, &mut stdout, unread_only, mark_read)?;
    tracing::debug!(listed, mark_read, "messages printed");
    Ok(())
}

pub fn count(config: &MollymonConfig, unread_only: bool) -> Result<()> {
    let conn = open_store(&config.resolved_db_path(), false)?;
    print_message_count(&conn, &mut std::io::stdout().lock(), unread_only)?;
    Ok(())
}
