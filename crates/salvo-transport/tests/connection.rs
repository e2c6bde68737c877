//! Integration tests for `Connection` against a fake server on loopback.

use std::time::Duration;

use salvo_protocol::{Codec, Message, Report, StatusCode, TextCodec, encode_frame, frame_body};
use salvo_transport::{Connection, Inbound, InboundEvent, TransportError, read_frame};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn connect(port: u16) -> (Connection, mpsc::Receiver<Inbound>) {
    let (tx, rx) = mpsc::channel(16);
    let conn = Connection::connect("127.0.0.1", port, TextCodec, tx)
        .await
        .unwrap();
    (conn, rx)
}

fn report_frame(report: Report) -> Vec<u8> {
    encode_frame(&TextCodec, &report.into_message()).unwrap()
}

async fn next_event(rx: &mut mpsc::Receiver<Inbound>) -> InboundEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for inbound event")
        .expect("inbound channel closed")
        .event
}

async fn read_message(server: &mut TcpStream) -> Message {
    let body = timeout(Duration::from_secs(2), read_frame(server))
        .await
        .expect("timed out waiting for frame")
        .unwrap();
    TextCodec.decode(&body).unwrap()
}

// =========================================================================
// Connect
// =========================================================================

#[tokio::test]
async fn test_connect_refused_returns_connect_failed() {
    let (listener, port) = listener().await;
    drop(listener);

    let (tx, _rx) = mpsc::channel(1);
    let result = Connection::connect("127.0.0.1", port, TextCodec, tx).await;
    assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
}

#[tokio::test]
async fn test_connect_assigns_distinct_ids() {
    let (listener, port) = listener().await;
    let (a, _rx_a) = connect(port).await;
    let (b, _rx_b) = connect(port).await;
    assert_ne!(a.id(), b.id());
    drop(listener);
}

// =========================================================================
// Send
// =========================================================================

#[tokio::test]
async fn test_send_writes_length_prefixed_frame() {
    let (listener, port) = listener().await;
    let (conn, _rx) = connect(port).await;
    let (mut server, _) = listener.accept().await.unwrap();

    let msg = Message::new("game_join").with_param("name", "armada");
    conn.send(&msg).await.unwrap();

    assert_eq!(read_message(&mut server).await, msg);
}

#[tokio::test]
async fn test_send_after_disconnect_is_not_connected() {
    let (listener, port) = listener().await;
    let (conn, _rx) = connect(port).await;
    let _server = listener.accept().await.unwrap();

    conn.disconnect().await;
    assert!(!conn.is_open().await);
    assert!(matches!(
        conn.send(&Message::new("surrender")).await,
        Err(TransportError::NotConnected)
    ));
}

// =========================================================================
// Receive loop
// =========================================================================

#[tokio::test]
async fn test_receive_loop_forwards_known_reports() {
    let (listener, port) = listener().await;
    let (conn, mut rx) = connect(port).await;
    let (mut server, _) = listener.accept().await.unwrap();

    server
        .write_all(&report_frame(Report::new(StatusCode::BeginTurn)))
        .await
        .unwrap();

    match next_event(&mut rx).await {
        InboundEvent::Report(report) => assert_eq!(report.status, StatusCode::BeginTurn),
        other => panic!("expected report, got {other:?}"),
    }
    drop(conn);
}

#[tokio::test]
async fn test_receive_loop_survives_garbage_and_unknown_codes() {
    let (listener, port) = listener().await;
    let (_conn, mut rx) = connect(port).await;
    let (mut server, _) = listener.accept().await.unwrap();

    // Malformed body, then a status outside the table, then a missing
    // status, then a real report. Only the last one comes through.
    server.write_all(&frame_body(b"no separators here").unwrap()).await.unwrap();
    server
        .write_all(&encode_frame(&TextCodec, &Message::new("report").with_param("status", 99)).unwrap())
        .await
        .unwrap();
    server
        .write_all(&encode_frame(&TextCodec, &Message::new("report")).unwrap())
        .await
        .unwrap();
    server
        .write_all(&report_frame(Report::new(StatusCode::GameAborted)))
        .await
        .unwrap();

    match next_event(&mut rx).await {
        InboundEvent::Report(report) => assert_eq!(report.status, StatusCode::GameAborted),
        other => panic!("expected report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_receive_loop_reassembles_split_frame() {
    let (listener, port) = listener().await;
    let (_conn, mut rx) = connect(port).await;
    let (mut server, _) = listener.accept().await.unwrap();

    let frame = report_frame(
        Report::new(StatusCode::ChatBroadcast)
            .with_param("author_id", "7")
            .with_param("timestamp", 1)
            .with_param("message_content", "hi"),
    );
    let (head, tail) = frame.split_at(1);
    server.write_all(head).await.unwrap();
    server.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    server.write_all(tail).await.unwrap();

    match next_event(&mut rx).await {
        InboundEvent::Report(report) => {
            assert_eq!(report.status, StatusCode::ChatBroadcast);
            assert_eq!(report.params.get("message_content").map(String::as_str), Some("hi"));
        }
        other => panic!("expected report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_receive_loop_server_close_reports_closed() {
    let (listener, port) = listener().await;
    let (conn, mut rx) = connect(port).await;
    let (server, _) = listener.accept().await.unwrap();
    drop(server);

    match next_event(&mut rx).await {
        InboundEvent::Closed { .. } => {}
        other => panic!("expected closed, got {other:?}"),
    }
    drop(conn);
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_sends_leave_notification_and_is_idempotent() {
    let (listener, port) = listener().await;
    let (conn, mut rx) = connect(port).await;
    let (mut server, _) = listener.accept().await.unwrap();

    conn.disconnect().await;
    conn.disconnect().await;

    assert_eq!(read_message(&mut server).await.kind, "game_abort");

    // A requested stop is not reported as a lost connection.
    let quiet = timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(!matches!(quiet, Ok(Some(_))));
}
