//! WebSocket transport tests against a local tungstenite server.

mod common;

use bytes::Bytes;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use common::*;
use telewire::exchange::fetch_chart;
use telewire::protocol::{Batch, ChartPoint, ClientMessage, ServerMessage, StatsQueryKind};
use telewire::rules::RuleAdmin;
use telewire::session::{Session, SessionCommand, SessionMode};
use telewire::sync::SyncEvent;
use telewire::transport::{admin_endpoint, Connector, Transport, WsConnector, WsTransport};

/// Bind a listener and return it with the admin endpoint that reaches it.
async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = admin_endpoint(&format!("http://{}/admin", addr)).unwrap();
    (listener, endpoint)
}

async fn accept_ws(listener: &TcpListener) -> WsTransport<tokio::net::TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    WsTransport::new(ws)
}

#[tokio::test]
async fn test_binary_frames_round_trip() {
    let (listener, endpoint) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = accept_ws(&listener).await;
        let frame = server.recv().await.unwrap().unwrap();
        server.send(frame).await.unwrap();
        // Client closes; the stream ends
        assert!(server.recv().await.is_none());
    });

    let mut client = WsConnector::new(endpoint).connect().await.unwrap();
    client.send(Bytes::from_static(&[1])).await.unwrap();
    assert_eq!(client.recv().await.unwrap().unwrap(), Bytes::from_static(&[1]));
    client.close().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_text_messages_are_skipped() {
    use futures::SinkExt;
    use tokio_tungstenite::tungstenite::Message;

    let (listener, endpoint) = listen().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("hello".to_string())).await.unwrap();
        ws.send(Message::Binary(vec![9, 0, 0, 0, 0, 0, 0, 0, 5]))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let mut client = WsConnector::new(endpoint).connect().await.unwrap();
    let frame = client.recv().await.unwrap().unwrap();
    assert_eq!(frame[0], 9);
    assert!(client.recv().await.is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn test_rule_listing_over_websocket() {
    let (listener, endpoint) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = accept_ws(&listener).await;
        let request = server.recv().await.unwrap().unwrap();
        assert_eq!(ClientMessage::decode(&request).unwrap(), ClientMessage::GetRules);
        server.send(ServerMessage::Rules(vec![]).encode()).await.unwrap();
        let _ = server.recv().await;
    });

    let rules = RuleAdmin::new(WsConnector::new(endpoint))
        .list_rules()
        .await
        .unwrap();
    assert!(rules.is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn test_chart_over_websocket() {
    let (listener, endpoint) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = accept_ws(&listener).await;
        server.recv().await.unwrap().unwrap();
        let point = ChartPoint {
            requests: 120,
            latency_sum: 1_200,
            connects: 6,
            end: 120_000,
            start: 60_000,
            memory_bytes: 2 * 1024 * 1024,
        };
        server
            .send(ServerMessage::Chart(Batch::new(130_000, vec![point])).encode())
            .await
            .unwrap();
        let _ = server.recv().await;
    });

    let series = fetch_chart(&WsConnector::new(endpoint), None).await.unwrap();
    assert_eq!(series.requests_per_sec, vec![2.0]);
    assert_eq!(series.connects_per_sec, vec![0.1]);
    assert_eq!(series.avg_latency_micros, vec![10.0]);
    assert_eq!(series.memory_mib, vec![2.0]);
    server.await.unwrap();
}

#[tokio::test]
async fn test_stats_session_over_websocket() {
    let (listener, endpoint) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = accept_ws(&listener).await;
        let request = server.recv().await.unwrap().unwrap();
        assert_eq!(
            ClientMessage::decode(&request).unwrap(),
            ClientMessage::StatsQuery {
                cursor: 0,
                kind: StatsQueryKind::Initial
            }
        );
        server
            .send(stats_reply(1_000, &[60_000, 120_000]).encode())
            .await
            .unwrap();
        // Drain until the client leaves
        while let Some(Ok(_)) = server.recv().await {}
    });

    let session = Session::new(
        WsConnector::new(endpoint),
        session_config(SessionMode::Stats),
    );
    let mut events = session.subscribe();
    let commands = session.commands();
    let handle = session.start(CancellationToken::new());

    next_matching(&mut events, |e| matches!(e, SyncEvent::StatsSeeded(_))).await;
    commands.send(SessionCommand::Close).await.unwrap();

    let sync = handle.await.unwrap().unwrap();
    assert_eq!(sync.stats().len(), 2);
    server.await.unwrap();
}
