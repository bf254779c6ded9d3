mod helpers;

use helpers::TempStore;
use mollymon::config::ContactConfig;
use mollymon::contact::{list_messages, MessageFilter};
use mollymon::scgi::{encode_request, server, ContactService};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::oneshot;

fn service(store: &TempStore) -> ContactService {
    let config = ContactConfig {
        read_timeout_secs: 2,
        ..ContactConfig::default()
    };
    ContactService::new(Arc::new(Mutex::new(store.open())), Arc::new(config))
}

async fn send(socket: &Path, wire: &[u8]) -> Vec<u8> {
    let mut stream = UnixStream::connect(socket).await.unwrap();
    stream.write_all(wire).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn message_over_socket_is_stored() {
    let store = TempStore::new();
    let socket = store.dir.path().join("run").join("contact.sock");
    let (stop, stopped) = oneshot::channel::<()>();

    let listener = server::bind(&socket).unwrap();
    let server = tokio::spawn(server::serve(listener, service(&store), async move {
        let _ = stopped.await;
    }));

    let wire = encode_request(
        &[
            ("CONTENT_LENGTH", "0"),
            ("SCGI", "1"),
            ("REMOTE_ADDR", "192.0.2.10"),
            ("SCRIPT_PATH", "/contact"),
            ("QUERY_STRING", "nice+capsule%21"),
        ],
        b"",
    );
    let response = send(&socket, &wire).await;
    assert_eq!(response, b"20 text/plain\r\nThank you for your message!\n");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    let messages = list_messages(&store.open(), &MessageFilter::default()).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, "nice capsule!");
    assert_eq!(messages[0].client_address.as_deref(), Some("192.0.2.10"));
    assert_eq!(messages[0].script_path.as_deref(), Some("/contact"));
    assert!(!messages[0].read);
}

#[tokio::test]
async fn malformed_request_does_not_stop_the_service() {
    let store = TempStore::new();
    let socket = store.dir.path().join("contact.sock");
    let (stop, stopped) = oneshot::channel::<()>();

    let listener = server::bind(&socket).unwrap();
    let server = tokio::spawn(server::serve(listener, service(&store), async move {
        let _ = stopped.await;
    }));

    // the service closes without a response; the close itself may surface
    // as a reset on our side
    let mut stream = UnixStream::connect(&socket).await.unwrap();
    stream.write_all(b"not a netstring at all").await.unwrap();
    let mut garbage = Vec::new();
    let _ = stream.read_to_end(&mut garbage).await;
    assert!(garbage.is_empty());

    let prompt = send(
        &socket,
        &encode_request(&[("CONTENT_LENGTH", "0"), ("SCGI", "1")], b""),
    )
    .await;
    assert_eq!(prompt, b"10 Please enter your message.\r\n");

    let body = b"hello from the body";
    let len = body.len().to_string();
    let ok = send(
        &socket,
        &encode_request(&[("CONTENT_LENGTH", len.as_str()), ("SCGI", "1")], body),
    )
    .await;
    assert!(ok.starts_with(b"20 "));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    let messages = list_messages(&store.open(), &MessageFilter::default()).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, "hello from the body");
}

#[tokio::test]
async fn run_replaces_stale_socket_and_removes_it_on_shutdown() {
    let store = TempStore::new();
    let socket = store.dir.path().join("contact.sock");
    std::fs::write(&socket, b"stale").unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let path = socket.clone();
    let service = service(&store);
    let server = tokio::spawn(async move {
        server::run(&path, service, async move {
            let _ = stopped.await;
        })
        .await
    });

    // wait for the listener to come up
    let mut connected = false;
    for _ in 0..50 {
        if UnixStream::connect(&socket).await.is_ok() {
            connected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(connected, "service never started listening");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert!(!socket.exists());
}

#[tokio::test]
async fn shutdown_is_seen_while_all_slots_are_busy() {
    let store = TempStore::new();
    let socket = store.dir.path().join("contact.sock");
    let config = ContactConfig {
        read_timeout_secs: 2,
        max_connections: 1,
        ..ContactConfig::default()
    };
    let service = ContactService::new(Arc::new(Mutex::new(store.open())), Arc::new(config));
    let (stop, stopped) = oneshot::channel::<()>();

    let listener = server::bind(&socket).unwrap();
    let server = tokio::spawn(server::serve(listener, service, async move {
        let _ = stopped.await;
    }));

    // Both peers stall: the first holds the only slot, the second waits.
    let _holding = UnixStream::connect(&socket).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _waiting = UnixStream::connect(&socket).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    stop.send(()).unwrap();
    // Only the first connection's read timeout has to run out; the waiting
    // peer is never accepted.
    let finished = tokio::time::timeout(Duration::from_secs(3), server).await;
    assert!(finished.is_ok(), "serve kept accepting after shutdown");
    finished.unwrap().unwrap().unwrap();
}
