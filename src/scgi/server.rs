//! The long-running SCGI service on a Unix domain socket.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixListener;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::handler::ContactService;

/// Pause after a failed `accept` so a persistent error (e.g. fd exhaustion)
/// does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind `socket_path`, replacing a stale socket file and creating the parent
/// directory if needed.
pub fn bind(socket_path: &Path) -> Result<UnixListener> {
    if let Some(parent) = socket_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    if socket_path.exists() {
        std::fs::remove_file(socket_path)
            .with_context(|| format!("failed to remove stale socket {}", socket_path.display()))?;
    }
    UnixListener::bind(socket_path)
        .with_context(|| format!("failed to bind {}", socket_path.display()))
}

/// Accept connections until `shutdown` resolves, one task per connection,
/// at most `max_connections` at a time. In-flight connections are allowed to
/// finish (each is bounded by the read timeout) before this returns.
pub async fn serve<F>(listener: UnixListener, service: ContactService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let limiter = Arc::new(Semaphore::new(service.config().max_connections.max(1)));
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        // Wait for a free slot first, so shutdown is noticed even when every
        // slot is busy.
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = Arc::clone(&limiter).acquire_owned() => {
                permit.context("connection limiter closed")?
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                log_join(joined);
                continue;
            }
        };

        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _addr)) => stream,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                let service = service.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    match service.handle_connection(stream).await {
                        Ok(response) => tracing::debug!(status = response.status(), "request served"),
                        Err(e) => tracing::warn!(error = %e, "dropped malformed request"),
                    }
                });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
        }
    }
    tracing::info!("shutdown requested, no longer accepting connections");

    drop(listener);
    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
    tracing::info!("contact service stopped");
    Ok(())
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "connection task failed");
    }
}

/// Bind the configured socket and serve until `shutdown` resolves, removing
/// the socket file afterwards.
pub async fn run<F>(socket_path: &Path, service: ContactService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = bind(socket_path)?;
    tracing::info!(socket = %socket_path.display(), "contact service listening");

    let result = serve(listener, service, shutdown).await;

    if let Err(e) = std::fs::remove_file(socket_path) {
        tracing::debug!(error = %e, "socket file already gone");
    }
    result
}
