//! telewire - client for binary admin telemetry channels
//!
//! Connects to a server's admin WebSocket, keeps an incremental copy of its
//! stats history and request log, fetches aggregated chart series and
//! administers matching rules.
//!
//! Layers, bottom up:
//!
//! - [`codec`] - big-endian primitives and text fields over byte buffers
//! - [`protocol`] - opcodes, client messages and server records
//! - [`dispatch`] - opcode to handler routing for inbound frames
//! - [`transport`] - the binary message channel and its connectors
//! - [`sync`] - cursor-driven merge of telemetry batches
//! - [`session`] - connection lifecycle, probe and tail timers
//! - [`exchange`] and [`rules`] - one-shot request/response exchanges

pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod exchange;
pub mod logging;
pub mod protocol;
pub mod rules;
pub mod session;
pub mod sync;
pub mod transport;
