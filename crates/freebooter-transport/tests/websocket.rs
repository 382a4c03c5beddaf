//! Integration tests for the network I/O thread.
//!
//! These tests start a real `NetworkService` on an OS-assigned port and
//! talk to it with a tokio-tungstenite client, the same way a game client
//! would.

use std::time::Duration;

use freebooter_transport::{Connection, NetworkEvent, NetworkService};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Helper: starts a service whose events land in a channel.
fn start_service() -> (NetworkService, String, mpsc::UnboundedReceiver<NetworkEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut service = NetworkService::new(move |event| {
        let _ = tx.send(event);
    });
    let addr = service.listen("127.0.0.1:0").expect("should bind");
    service.start().expect("should start");
    (service, addr.to_string(), rx)
}

async fn connect_client(addr: &str) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<NetworkEvent>) -> NetworkEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event should arrive in time")
        .expect("channel should stay open")
}

async fn expect_connected(rx: &mut mpsc::UnboundedReceiver<NetworkEvent>) -> Connection {
    match next_event(rx).await {
        NetworkEvent::Connected(connection) => connection,
        other => panic!("expected Connected, got {other:?}"),
    }
}

/// Polls `try_recv` the way the main loop does, without blocking.
async fn poll_frame(connection: &mut Connection) -> Vec<u8> {
    for _ in 0..500 {
        if let Some(frame) = connection.try_recv() {
            return frame;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no frame arrived");
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_start_before_listen_fails() {
    let mut service = NetworkService::new(|_| {});
    assert!(service.start().is_err());
    assert!(!service.is_running());
}

#[test]
fn test_start_twice_fails() {
    let mut service = NetworkService::new(|_| {});
    service.listen("127.0.0.1:0").expect("should bind");
    service.start().expect("first start should succeed");
    assert!(service.start().is_err());
    service.shutdown();
    assert!(!service.is_running());
}

#[test]
fn test_listen_reports_assigned_port() {
    let mut service = NetworkService::new(|_| {});
    let addr = service.listen("127.0.0.1:0").expect("should bind");
    assert_ne!(addr.port(), 0);
    assert_eq!(service.local_addr(), Some(addr));
}

// =========================================================================
// Traffic
// =========================================================================

#[tokio::test]
async fn test_client_connect_is_reported() {
    let (_service, addr, mut events) = start_service();

    let _client = connect_client(&addr).await;
    let connection = expect_connected(&mut events).await;

    assert!(connection.is_open());
    assert!(connection.id().into_inner() > 0);
}

#[tokio::test]
async fn test_frames_flow_both_ways() {
    let (_service, addr, mut events) = start_service();

    let mut client = connect_client(&addr).await;
    let mut connection = expect_connected(&mut events).await;

    client
        .send(Message::Binary(b"hello from client".to_vec().into()))
        .await
        .expect("client send should succeed");
    assert_eq!(poll_frame(&mut connection).await, b"hello from client");

    assert!(connection.sender().send(b"hello from server".to_vec()));
    let reply = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("reply should arrive in time")
        .expect("stream should stay open")
        .expect("frame should be valid");
    assert_eq!(reply.into_data().as_ref(), b"hello from server");
}

#[tokio::test]
async fn test_text_frames_are_delivered_as_bytes() {
    let (_service, addr, mut events) = start_service();

    let mut client = connect_client(&addr).await;
    let mut connection = expect_connected(&mut events).await;

    client
        .send(Message::Text("{\"type\":\"chat_message\"}".into()))
        .await
        .expect("client send should succeed");
    assert_eq!(poll_frame(&mut connection).await, b"{\"type\":\"chat_message\"}");
}

#[tokio::test]
async fn test_client_close_reports_lost_after_connected() {
    let (_service, addr, mut events) = start_service();

    let mut client = connect_client(&addr).await;
    let connection = expect_connected(&mut events).await;
    let id = connection.id();

    client.close(None).await.expect("close should succeed");

    match next_event(&mut events).await {
        NetworkEvent::Lost(lost) => assert_eq!(lost, id),
        other => panic!("expected Lost, got {other:?}"),
    }
    assert!(!connection.is_open());
    assert!(!connection.sender().send(b"too late".to_vec()));
}

#[tokio::test]
async fn test_each_connection_gets_a_distinct_id() {
    let (_service, addr, mut events) = start_service();

    let _a = connect_client(&addr).await;
    let first = expect_connected(&mut events).await;
    let _b = connect_client(&addr).await;
    let second = expect_connected(&mut events).await;

    assert_ne!(first.id(), second.id());
}
