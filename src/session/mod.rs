//! Long-lived telemetry sessions.
//!
//! A [`Session`] owns one admin channel. After the channel opens it sends
//! the handshake for its [`SessionMode`], then multiplexes inbound frames,
//! the probe timer, the tail timer and [`SessionCommand`]s in a single task.
//! Merged records go out as [`SyncEvent`]s on a broadcast channel; liveness
//! goes out on a watch channel. A closed channel ends the session for good.

mod error;
mod state;

pub use error::{LifecycleError, SessionError};
pub use state::{ConnectionState, Lifecycle};

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::codec::{DecodeError, Reader};
use crate::config::TelewireConfig;
use crate::dispatch::Dispatcher;
use crate::protocol::{
    Batch, ClientMessage, Opcode, Record, RequestLogEntry, StatEntry, StatsQueryKind,
};
use crate::sync::{SyncEvent, TelemetrySync, DEFAULT_REQUEST_LOG_CAPACITY};
use crate::transport::{Connector, Transport};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Which feed a session follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Stats history with pagination; pongs extend it
    Stats,
    /// Request log tail; pongs only carry server time
    Requests,
}

/// Requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Ask for the stats page just older than what is held
    LoadOlder,
    SetPaused(bool),
    Close,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: SessionMode,
    pub probe_interval: Duration,
    pub tail_interval: Duration,
    pub request_log_capacity: usize,
}

impl SessionConfig {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            probe_interval: Duration::from_secs(3),
            tail_interval: Duration::from_secs(3),
            request_log_capacity: DEFAULT_REQUEST_LOG_CAPACITY,
        }
    }

    pub fn from_config(config: &TelewireConfig, mode: SessionMode) -> Self {
        Self {
            mode,
            probe_interval: Duration::from_secs(config.connection.probe_interval_seconds),
            tail_interval: Duration::from_secs(config.connection.tail_interval_seconds),
            request_log_capacity: config.sync.request_log_capacity,
        }
    }

    fn handshake(&self) -> ClientMessage {
        match self.mode {
            SessionMode::Stats => ClientMessage::StatsQuery {
                cursor: 0,
                kind: StatsQueryKind::Initial,
            },
            SessionMode::Requests => ClientMessage::RecentRequests { cursor: 0 },
        }
    }
}

/// Dispatcher state: the synchronizer plus events produced by the frame
/// being handled.
#[derive(Debug)]
struct SessionState {
    sync: TelemetrySync,
    outbox: Vec<SyncEvent>,
}

fn decode_batch<T: Record>(payload: &[u8]) -> Result<Batch<T>, DecodeError> {
    Batch::decode(&mut Reader::new(payload))
}

fn dispatcher(mode: SessionMode) -> Dispatcher<SessionState> {
    let mut dispatcher = Dispatcher::new();
    match mode {
        SessionMode::Stats => {
            dispatcher
                .register(Opcode::Stats, |state: &mut SessionState, payload: &[u8]| {
                    let batch = decode_batch::<StatEntry>(payload)?;
                    let events = state.sync.apply_stats(batch);
                    state.outbox.extend(events);
                    Ok(())
                })
                .register(Opcode::Ping, |state: &mut SessionState, payload: &[u8]| {
                    let batch = decode_batch::<StatEntry>(payload)?;
                    let events = state.sync.apply_pong(batch);
                    state.outbox.extend(events);
                    Ok(())
                });
        }
        SessionMode::Requests => {
            dispatcher
                .register(Opcode::Ping, |state: &mut SessionState, payload: &[u8]| {
                    let batch = decode_batch::<StatEntry>(payload)?;
                    let event = state.sync.observe_server_time(batch.server_time);
                    state.outbox.push(event);
                    Ok(())
                })
                .register(
                    Opcode::MostRecentRequests,
                    |state: &mut SessionState, payload: &[u8]| {
                        let batch = decode_batch::<RequestLogEntry>(payload)?;
                        let events = state.sync.apply_requests(batch);
                        state.outbox.extend(events);
                        Ok(())
                    },
                );
        }
    }
    dispatcher
}

/// One telemetry session over one channel.
pub struct Session<C: Connector> {
    connector: C,
    config: SessionConfig,
    lifecycle: Lifecycle,
    events: broadcast::Sender<SyncEvent>,
    commands_tx: mpsc::Sender<SessionCommand>,
    commands_rx: mpsc::Receiver<SessionCommand>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        Self {
            connector,
            config,
            lifecycle: Lifecycle::new(),
            events,
            commands_tx,
            commands_rx,
        }
    }

    /// Receive merged records. Subscribe before [`run`](Self::run) to see
    /// the seed.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.lifecycle.subscribe()
    }

    pub fn commands(&self) -> mpsc::Sender<SessionCommand> {
        self.commands_tx.clone()
    }

    /// Connect and follow the feed until the channel closes, a `Close`
    /// command arrives or `cancel_token` fires. Returns the final state.
    pub async fn run(mut self, cancel_token: CancellationToken) -> Result<TelemetrySync, SessionError> {
        let endpoint = self.connector.endpoint().to_string();
        tracing::info!(endpoint = %endpoint, mode = ?self.config.mode, "Connecting to admin channel");

        let mut transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(e) => {
                self.lifecycle.close();
                let _ = self.events.send(SyncEvent::Closed);
                return Err(e.into());
            }
        };
        self.lifecycle.open()?;
        tracing::info!(endpoint = %endpoint, "Admin channel open");

        let mut state = SessionState {
            sync: TelemetrySync::new(self.config.request_log_capacity),
            outbox: Vec::new(),
        };
        let dispatcher = dispatcher(self.config.mode);

        let mut probe = interval_at(
            Instant::now() + self.config.probe_interval,
            self.config.probe_interval,
        );
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tail = interval_at(
            Instant::now() + self.config.tail_interval,
            self.config.tail_interval,
        );
        tail.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let tailing = self.config.mode == SessionMode::Requests;

        if send(&mut transport, &self.config.handshake()).await {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Session cancelled");
                        break;
                    }
                    inbound = transport.recv() => match inbound {
                        Some(Ok(frame)) => {
                            dispatcher.dispatch(&mut state, &frame);
                            for event in state.outbox.drain(..) {
                                let _ = self.events.send(event);
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Admin channel failed");
                            break;
                        }
                        None => {
                            tracing::info!("Admin channel closed by server");
                            break;
                        }
                    },
                    _ = probe.tick() => {
                        if !send(&mut transport, &ClientMessage::Ping).await {
                            break;
                        }
                    }
                    _ = tail.tick(), if tailing => {
                        if !send(&mut transport, &state.sync.tail_request()).await {
                            break;
                        }
                    }
                    Some(command) = self.commands_rx.recv() => match command {
                        SessionCommand::LoadOlder => match state.sync.older_page_request() {
                            Some(request) => {
                                if !send(&mut transport, &request).await {
                                    break;
                                }
                            }
                            None => tracing::debug!("No older stats page to request"),
                        },
                        SessionCommand::SetPaused(paused) => {
                            for event in state.sync.set_paused(paused) {
                                let _ = self.events.send(event);
                            }
                        }
                        SessionCommand::Close => {
                            tracing::info!("Session closed on request");
                            break;
                        }
                    },
                }
            }
        }

        self.lifecycle.close();
        if let Err(e) = transport.close().await {
            tracing::debug!(error = %e, "Error while closing admin channel");
        }
        let _ = self.events.send(SyncEvent::Closed);

        Ok(state.sync)
    }

    /// Run on a background task, the way long-lived services are started.
    pub fn start(self, cancel_token: CancellationToken) -> tokio::task::JoinHandle<Result<TelemetrySync, SessionError>>
    where
        C: 'static,
    {
        tokio::spawn(self.run(cancel_token))
    }
}

/// Send one request. A failed send means the channel is gone.
async fn send<T: Transport>(transport: &mut T, message: &ClientMessage) -> bool {
    let frame = match message.encode() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode request");
            return true;
        }
    };
    match transport.send(frame).await {
        Ok(()) => {
            tracing::trace!(opcode = message.opcode().as_u8(), "Request sent");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to send on admin channel");
            false
        }
    }
}
