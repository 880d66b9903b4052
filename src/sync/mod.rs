//! Incremental telemetry state.
//!
//! [`TelemetrySync`] holds what one session has learned from the server:
//! the stats history (oldest first), the request log window (newest first)
//! and the cursors that keep both free of duplicates. Every `apply_*`
//! method takes a fully decoded batch, so a frame that fails to decode
//! never reaches the state.

mod chart;
mod cursor;


pub use chart::ChartSeries;
pub use cursor::SyncCursor;

use serde::Serialize;
use std::collections::VecDeque;

use crate::protocol::{Batch, ClientMessage, RequestLogEntry, StatEntry, StatsQueryKind};

/// Default number of request log entries kept.
pub const DEFAULT_REQUEST_LOG_CAPACITY: usize = 100;

/// A change to the synchronized state, published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The first stats response arrived; oldest first
    StatsSeeded(Vec<StatEntry>),
    /// An older page was accepted and placed before everything held
    StatsPrepended(Vec<StatEntry>),
    /// New intervals from a pong, oldest first
    StatsAppended(Vec<StatEntry>),
    /// An older page came back empty; there is no more history
    HistoryExhausted,
    /// New request log entries, newest first
    RequestsPrepended(Vec<RequestLogEntry>),
    /// Server clock from the latest decoded response, Unix milliseconds
    ServerTime(u64),
    /// The session ended
    Closed,
}

/// Client-held copy of the server's telemetry.
#[derive(Debug, Clone)]
pub struct TelemetrySync {
    stats: Vec<StatEntry>,
    requests: VecDeque<RequestLogEntry>,
    request_log_capacity: usize,
    /// Newest interval timestamp merged
    stats_tail: SyncCursor,
    /// Oldest interval timestamp held
    stats_page: SyncCursor,
    /// Newest request end time merged, microseconds
    request_tail: SyncCursor,
    seeded: bool,
    /// Snapshot received while paused
    pending_seed: Option<Vec<StatEntry>>,
    exhausted: bool,
    paused: bool,
    server_time: Option<u64>,
}

impl Default for TelemetrySync {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_LOG_CAPACITY)
    }
}

impl TelemetrySync {
    pub fn new(request_log_capacity: usize) -> Self {
        Self {
            stats: Vec::new(),
            requests: VecDeque::with_capacity(request_log_capacity),
            request_log_capacity,
            stats_tail: SyncCursor::default(),
            stats_page: SyncCursor::default(),
            request_tail: SyncCursor::default(),
            seeded: false,
            pending_seed: None,
            exhausted: false,
            paused: false,
            server_time: None,
        }
    }

    /// Stats history, ascending by timestamp.
    pub fn stats(&self) -> &[StatEntry] {
        &self.stats
    }

    /// Request log window, newest first.
    pub fn requests(&self) -> &VecDeque<RequestLogEntry> {
        &self.requests
    }

    pub fn server_time(&self) -> Option<u64> {
        self.server_time
    }

    pub fn stats_tail_cursor(&self) -> SyncCursor {
        self.stats_tail
    }

    pub fn stats_page_cursor(&self) -> SyncCursor {
        self.stats_page
    }

    pub fn request_cursor(&self) -> SyncCursor {
        self.request_tail
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While paused only the server time moves.
    ///
    /// A snapshot that arrived while paused is held and seeds the history
    /// on resume; the returned events describe that seed.
    pub fn set_paused(&mut self, paused: bool) -> Vec<SyncEvent> {
        if self.paused != paused {
            tracing::debug!(paused, "Telemetry merge toggled");
        }
        self.paused = paused;

        match self.pending_seed.take() {
            Some(snapshot) if !paused => self.seed(snapshot),
            held => {
                self.pending_seed = held;
                Vec::new()
            }
        }
    }

    /// Record the server clock carried by a response.
    pub fn observe_server_time(&mut self, server_time: u64) -> SyncEvent {
        self.server_time = Some(server_time);
        SyncEvent::ServerTime(server_time)
    }

    /// Apply a stats response: the first one seeds the history, every later
    /// one is an older page.
    pub fn apply_stats(&mut self, batch: Batch<StatEntry>) -> Vec<SyncEvent> {
        let mut events = vec![self.observe_server_time(batch.server_time)];

        if !self.seeded {
            if self.paused {
                tracing::debug!(count = batch.records.len(), "Holding stats snapshot until resumed");
                self.pending_seed = Some(batch.records);
            } else {
                events.extend(self.seed(batch.records));
            }
            return events;
        }

        if self.paused {
            return events;
        }

        if batch.records.is_empty() {
            if !self.exhausted {
                tracing::debug!(cursor = self.stats_page.value(), "Stats history exhausted");
                self.exhausted = true;
                events.push(SyncEvent::HistoryExhausted);
            }
            return events;
        }

        let page_cursor = self.stats_page.value();
        let accepted: Vec<StatEntry> = batch
            .records
            .into_iter()
            .filter(|s| s.timestamp < page_cursor)
            .collect();

        if let Some(oldest) = accepted.iter().map(|s| s.timestamp).min() {
            self.stats_page.reset(oldest);
            self.stats.splice(0..0, accepted.iter().copied());
            count_merged("stats", accepted.len());
            tracing::debug!(count = accepted.len(), cursor = oldest, "Older stats page merged");
            events.push(SyncEvent::StatsPrepended(accepted));
        }

        events
    }

    fn seed(&mut self, snapshot: Vec<StatEntry>) -> Vec<SyncEvent> {
        self.seeded = true;
        let (Some(oldest), Some(newest)) = (
            snapshot.iter().map(|s| s.timestamp).min(),
            snapshot.iter().map(|s| s.timestamp).max(),
        ) else {
            tracing::debug!("Empty stats snapshot, no history to page");
            self.exhausted = true;
            return vec![SyncEvent::HistoryExhausted];
        };

        self.stats_page.reset(oldest);
        self.stats_tail.advance(newest);
        self.stats = snapshot.clone();
        count_merged("stats", self.stats.len());
        tracing::debug!(count = self.stats.len(), oldest, newest, "Stats history seeded");
        vec![SyncEvent::StatsSeeded(snapshot)]
    }

    /// Apply a pong: intervals newer than the tail cursor join the newest
    /// end of the history.
    ///
    /// Nothing is merged before the snapshot has seeded the history.
    pub fn apply_pong(&mut self, batch: Batch<StatEntry>) -> Vec<SyncEvent> {
        let mut events = vec![self.observe_server_time(batch.server_time)];
        if self.paused || !self.seeded {
            return events;
        }

        let mut appended = Vec::new();
        for stat in batch.records {
            if self.stats_tail.advance(stat.timestamp) {
                appended.push(stat);
            }
        }

        if !appended.is_empty() {
            self.stats.extend_from_slice(&appended);
            count_merged("stats", appended.len());
            events.push(SyncEvent::StatsAppended(appended));
        }

        events
    }

    /// Apply a recent-requests response: entries that ended after the
    /// cursor go to the front of the window, which is then trimmed.
    pub fn apply_requests(&mut self, batch: Batch<RequestLogEntry>) -> Vec<SyncEvent> {
        let mut events = vec![self.observe_server_time(batch.server_time)];
        if self.paused {
            return events;
        }

        let mut merged = Vec::new();
        for entry in batch.records {
            if self.request_tail.advance(entry.end_micros) {
                merged.push(entry);
            }
        }

        if merged.is_empty() {
            return events;
        }

        // Cursor order makes each merged entry newer than the previous one
        for entry in &merged {
            self.requests.push_front(entry.clone());
        }
        merged.reverse();
        self.requests.truncate(self.request_log_capacity);

        count_merged("requests", merged.len());
        events.push(SyncEvent::RequestsPrepended(merged));
        events
    }

    /// Request for the page just older than what is held, if there can be
    /// one.
    pub fn older_page_request(&self) -> Option<ClientMessage> {
        if !self.seeded || self.exhausted {
            return None;
        }
        Some(ClientMessage::StatsQuery {
            cursor: self.stats_page.value(),
            kind: StatsQueryKind::Older,
        })
    }

    /// Request for entries completed after the request log cursor.
    pub fn tail_request(&self) -> ClientMessage {
        ClientMessage::RecentRequests {
            cursor: self.request_tail.value(),
        }
    }
}

fn count_merged(stream: &'static str, count: usize) {
    metrics::counter!("telewire_records_merged_total", "stream" => stream).increment(count as u64);
}
