//! Per-connection request handling: read, dispatch, respond, close.

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::framing::{read_request, FrameLimits};
use super::request::ScgiRequest;
use crate::config::ContactConfig;
use crate::contact::{insert_message, NewMessage};
use crate::error::FramingError;
use crate::gemini::Response;

/// Shared state for all connections: the store handle and the settings.
#[derive(Clone)]
pub struct ContactService {
    db: Arc<Mutex<Connection>>,
    config: Arc<ContactConfig>,
}

/// Owned copy of the fields stored for a submission, so the insert can run
/// on the blocking pool.
struct Submission {
    body: String,
    client_address: Option<String>,
    script_path: Option<String>,
    path_info: Option<String>,
    tls_client_hash: Option<String>,
}

impl ContactService {
    pub fn new(db: Arc<Mutex<Connection>>, config: Arc<ContactConfig>) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &ContactConfig {
        &self.config
    }

    fn limits(&self) -> FrameLimits {
        FrameLimits {
            max_header_bytes: self.config.max_header_bytes,
            max_body_bytes: self.config.max_body_bytes,
        }
    }

    /// Serve exactly one request on `stream` and close it.
    ///
    /// A framing error (including a read timeout) closes the connection without
    /// writing anything and is returned to the caller for logging.
    pub async fn handle_connection<S>(&self, stream: S) -> Result<Response, FramingError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let read = tokio::time::timeout(
            self.config.read_timeout(),
            read_request(&mut reader, self.limits()),
        )
        .await;

        let request = match read {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                let _ = writer.shutdown().await;
                return Err(e);
            }
            Err(_) => {
                let _ = writer.shutdown().await;
                return Err(FramingError::TimedOut);
            }
        };

        let response = self.dispatch(&request).await;
        writer.write_all(&response.to_bytes()).await?;
        writer.shutdown().await?;
        Ok(response)
    }

    /// Turn a well-formed request into a response, storing the message if there is one.
    pub async fn dispatch(&self, request: &ScgiRequest) -> Response {
        let Some(body) = request.visitor_text(&self.config.input_header, self.config.body_fallback)
        else {
            tracing::debug!("no visitor input, prompting");
            return Response::input(self.config.prompt.clone());
        };

        let submission = Submission {
            body,
            client_address: request.non_empty_header("REMOTE_ADDR").map(str::to_string),
            script_path: request
                .non_empty_header("SCRIPT_PATH")
                .or_else(|| request.non_empty_header("SCRIPT_NAME"))
                .map(str::to_string),
            path_info: request.non_empty_header("PATH_INFO").map(str::to_string),
            tls_client_hash: request.non_empty_header("TLS_CLIENT_HASH").map(str::to_string),
        };

        match self.store(submission).await {
            Ok(id) => {
                tracing::info!(id, "visitor message stored");
                Response::text(self.config.thanks.clone())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to store visitor message");
                Response::temporary_failure(self.config.failure.clone())
            }
        }
    }

    async fn store(&self, submission: Submission) -> anyhow::Result<i64> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> anyhow::Result<i64> {
            let mut conn = db
                .lock()
                .map_err(|_| anyhow::anyhow!("message store lock poisoned"))?;
            let new = NewMessage {
                body: &submission.body,
                client_address: submission.client_address.as_deref(),
                script_path: submission.script_path.as_deref(),
                path_info: submission.path_info.as_deref(),
                tls_client_hash: submission.tls_client_hash.as_deref(),
            };
            let message = insert_message(&mut conn, &new)?;
            Ok(message.id)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{list_messages, MessageFilter};
    use crate::db::open_in_memory;
    use crate::scgi::framing::encode_request;
    use tokio::io::AsyncReadExt;

    fn service() -> ContactService {
        let conn = open_in_memory().unwrap();
        ContactService::new(
            Arc::new(Mutex::new(conn)),
            Arc::new(ContactConfig::default()),
        )
    }

    fn stored(service: &ContactService) -> Vec<crate::contact::Message> {
        let conn = service.db.lock().unwrap();
        list_messages(&conn, &MessageFilter::default()).unwrap()
    }

    async fn exchange(service: &ContactService, wire: Vec<u8>) -> (Result<Response, FramingError>, Vec<u8>) {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        client.write_all(&wire).await.unwrap();
        client.shutdown().await.unwrap();

        let outcome = service.handle_connection(server).await;
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        (outcome, received)
    }

    #[tokio::test]
    async fn body_message_is_stored_and_acknowledged() {
        let service = service();
        let wire = encode_request(
            &[("CONTENT_LENGTH", "11"), ("SCGI", "1"), ("REMOTE_ADDR", "192.0.2.1")],
            b"hello+world",
        );

        let (outcome, received) = exchange(&service, wire).await;

        assert_eq!(outcome.unwrap().status(), 20);
        assert_eq!(received, b"20 text/plain\r\nThank you for your message!\n");
        let messages = stored(&service);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "hello world");
        assert_eq!(messages[0].client_address.as_deref(), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn query_string_message_records_provenance() {
        let service = service();
        let wire = encode_request(
            &[
                ("CONTENT_LENGTH", "0"),
                ("QUERY_STRING", "Nice%20capsule%21"),
                ("SCRIPT_PATH", "/contact"),
                ("PATH_INFO", "/gemlog"),
                ("TLS_CLIENT_HASH", "SHA256:00ff"),
            ],
            b"",
        );

        let (outcome, _) = exchange(&service, wire).await;

        assert_eq!(outcome.unwrap().status(), 20);
        let messages = stored(&service);
        assert_eq!(messages[0].body, "Nice capsule!");
        assert_eq!(messages[0].script_path.as_deref(), Some("/contact"));
        assert_eq!(messages[0].path_info.as_deref(), Some("/gemlog"));
        assert_eq!(messages[0].tls_client_hash.as_deref(), Some("SHA256:00ff"));
        assert_eq!(messages[0].client_address, None);
    }

    #[tokio::test]
    async fn empty_input_prompts_without_storing() {
        let service = service();
        let wire = encode_request(&[("CONTENT_LENGTH", "0"), ("QUERY_STRING", "")], b"");

        let (outcome, received) = exchange(&service, wire).await;

        assert_eq!(outcome.unwrap().status(), 10);
        assert_eq!(received, b"10 Please enter your message.\r\n");
        assert!(stored(&service).is_empty());
    }

    #[tokio::test]
    async fn truncated_body_gets_no_response() {
        let service = service();
        let wire = encode_request(&[("CONTENT_LENGTH", "11")], b"hello");

        let (outcome, received) = exchange(&service, wire).await;

        assert!(matches!(outcome, Err(FramingError::Truncated)));
        assert!(received.is_empty());
        assert!(stored(&service).is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_a_temporary_failure() {
        let service = service();
        service
            .db
            .lock()
            .unwrap()
            .execute_batch("DROP TABLE messages")
            .unwrap();
        let wire = encode_request(&[("CONTENT_LENGTH", "2")], b"hi");

        let (outcome, received) = exchange(&service, wire).await;

        assert_eq!(outcome.unwrap().status(), 40);
        assert_eq!(
            received,
            b"40 Something went wrong. Error has been logged.\r\n"
        );
    }

    #[tokio::test]
    async fn stalled_peer_times_out() {
        let conn = open_in_memory().unwrap();
        let config = ContactConfig {
            read_timeout_secs: 1,
            ..Default::default()
        };
        let service = ContactService::new(Arc::new(Mutex::new(conn)), Arc::new(config));
        let (mut client, server) = tokio::io::duplex(1024);
        client.write_all(b"20:CONTENT_LEN").await.unwrap();

        let outcome = service.handle_connection(server).await;

        assert!(matches!(outcome, Err(FramingError::TimedOut)));
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert!(received.is_empty());
    }
}
