//! Shared test utilities for telewire integration tests.
//!
//! Provides record builders and an in-process server that plays the
//! other end of a [`MemoryConnector`].

#![allow(dead_code)]

use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;

use telewire::protocol::{
    Batch, ClientMessage, HttpMethod, HttpVersion, RequestLogEntry, ServerMessage, StatEntry,
};
use telewire::session::{Session, SessionConfig, SessionMode};
use telewire::sync::SyncEvent;
use telewire::transport::{MemoryConnector, MemoryTransport, Transport};

// =============================================================================
// Record Builders
// =============================================================================

/// One-minute stats interval ending at `timestamp`.
pub fn make_stat(timestamp: u64) -> StatEntry {
    StatEntry {
        requests: 60,
        connections: 2,
        timestamp,
        prev_timestamp: timestamp.saturating_sub(60_000),
        latency_sum_micros: 6_000,
        ..Default::default()
    }
}

pub fn make_stats(timestamps: &[u64]) -> Vec<StatEntry> {
    timestamps.iter().copied().map(make_stat).collect()
}

/// Completed request ending at `end_micros`.
pub fn make_request(end_micros: u64, uri: &str) -> RequestLogEntry {
    RequestLogEntry {
        method: HttpMethod::Get,
        version: HttpVersion::Http11,
        content_length: 512,
        start_micros: end_micros.saturating_sub(100),
        end_micros,
        status: 200,
        uri: uri.to_string(),
        query: String::new(),
        user_agent: "test-agent".to_string(),
        referer: String::new(),
        uri_requested: String::new(),
    }
}

pub fn stats_reply(server_time: u64, timestamps: &[u64]) -> ServerMessage {
    ServerMessage::Stats(Batch::new(server_time, make_stats(timestamps)))
}

pub fn pong_reply(server_time: u64, timestamps: &[u64]) -> ServerMessage {
    ServerMessage::Pong(Batch::new(server_time, make_stats(timestamps)))
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Session config with the default 3s timers.
pub fn session_config(mode: SessionMode) -> SessionConfig {
    SessionConfig::new(mode)
}

pub fn new_session(mode: SessionMode) -> (Session<MemoryConnector>, FakeServer) {
    let (connector, accept) = MemoryConnector::new();
    (
        Session::new(connector, session_config(mode)),
        FakeServer { accept, channel: None },
    )
}

// =============================================================================
// Fake Server
// =============================================================================

/// Server end of an in-process admin channel.
pub struct FakeServer {
    accept: mpsc::UnboundedReceiver<MemoryTransport>,
    channel: Option<MemoryTransport>,
}

impl FakeServer {
    /// Wait for the client to connect.
    pub async fn accept(&mut self) {
        let channel = self.accept.recv().await.expect("client never connected");
        self.channel = Some(channel);
    }

    fn channel(&mut self) -> &mut MemoryTransport {
        self.channel.as_mut().expect("no client connected")
    }

    /// Next request from the client, decoded.
    pub async fn request(&mut self) -> ClientMessage {
        let frame = self
            .channel()
            .recv()
            .await
            .expect("client closed the channel")
            .expect("transport error");
        ClientMessage::decode(&frame).expect("client sent an undecodable request")
    }

    /// Next request, or `None` if nothing arrives within `wait`.
    pub async fn request_within(&mut self, wait: Duration) -> Option<ClientMessage> {
        tokio::time::timeout(wait, self.request()).await.ok()
    }

    pub async fn reply(&mut self, message: ServerMessage) {
        self.channel().send(message.encode()).await.unwrap();
    }

    pub async fn send_raw(&mut self, frame: &[u8]) {
        self.channel()
            .send(Bytes::copy_from_slice(frame))
            .await
            .unwrap();
    }

    /// Drop the channel, as a server going away would.
    pub fn hang_up(&mut self) {
        self.channel = None;
    }

    pub fn is_client_gone(&self) -> bool {
        self.channel.as_ref().map_or(true, |c| c.is_closed())
    }
}

/// Receive events until one matches `pred`, returning it.
pub async fn next_matching<F>(
    events: &mut tokio::sync::broadcast::Receiver<SyncEvent>,
    mut pred: F,
) -> SyncEvent
where
    F: FnMut(&SyncEvent) -> bool,
{
    loop {
        let event = events.recv().await.expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}
