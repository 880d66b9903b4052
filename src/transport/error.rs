//! Transport error types

use thiserror::Error;

/// Errors raised by a [`Transport`](super::Transport) or
/// [`Connector`](super::Connector).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The base URL cannot be turned into an admin channel endpoint
    #[error("invalid endpoint '{0}': expected an http, https, ws or wss URL")]
    InvalidEndpoint(String),

    /// The default connector speaks plain WebSocket only
    #[error("TLS endpoints are not supported by this connector: {0}")]
    TlsUnsupported(String),

    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    /// The channel was already closed locally
    #[error("channel closed")]
    Closed,
}
