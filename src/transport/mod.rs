//! Message transport for the admin channel.
//!
//! The channel is persistent, ordered and message-preserving: one
//! [`Transport::send`] is one frame on the other side. [`Connector`] opens
//! fresh channels, which lets sessions and rule exchanges run against a real
//! WebSocket ([`WsConnector`]) or an in-process pair ([`MemoryConnector`]).

mod error;
pub mod memory;
pub mod ws;

pub use error::TransportError;
pub use memory::{MemoryConnector, MemoryTransport};
pub use ws::{WsConnector, WsTransport};

use async_trait::async_trait;
use bytes::Bytes;

/// One open, full-duplex frame channel.
#[async_trait]
pub trait Transport: Send {
    /// Send one frame.
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError>;

    /// Wait for the next inbound frame.
    ///
    /// `None` means the peer closed the channel. Must be cancel safe so it
    /// can sit in a `select!` next to timers.
    async fn recv(&mut self) -> Option<Result<Bytes, TransportError>>;

    /// Close the channel. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens new channels to one endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport + 'static;

    async fn connect(&self) -> Result<Self::Transport, TransportError>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> &str;
}

/// Derive the admin channel endpoint from a server base URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, and `ws`/`wss` are kept.
/// When the URL has no query, `?ws` is appended.
///
/// # Examples
///
/// ```
/// use telewire::transport::admin_endpoint;
///
/// assert_eq!(
///     admin_endpoint("http://127.0.0.1:8080/admin").unwrap(),
///     "ws://127.0.0.1:8080/admin?ws"
/// );
/// assert!(admin_endpoint("ftp://example.com").is_err());
/// ```
pub fn admin_endpoint(url: &str) -> Result<String, TransportError> {
    let url = url.trim();
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| TransportError::InvalidEndpoint(url.to_string()))?;

    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(TransportError::InvalidEndpoint(url.to_string())),
    };

    if rest.is_empty() || rest.starts_with('/') {
        return Err(TransportError::InvalidEndpoint(url.to_string()));
    }

    // Fragments never reach the server
    let rest = rest.split('#').next().unwrap_or(rest);

    if rest.contains('?') {
        Ok(format!("{}://{}", scheme, rest))
    } else {
        Ok(format!("{}://{}?ws", scheme, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_maps_to_ws() {
        assert_eq!(
            admin_endpoint("http://localhost:8080/").unwrap(),
            "ws://localhost:8080/?ws"
        );
    }

    #[test]
    fn test_https_maps_to_wss() {
        assert_eq!(
            admin_endpoint("HTTPS://example.com/stats").unwrap(),
            "wss://example.com/stats?ws"
        );
    }

    #[test]
    fn test_ws_kept() {
        assert_eq!(admin_endpoint("ws://h:1/a").unwrap(), "ws://h:1/a?ws");
        assert_eq!(admin_endpoint("wss://h/a").unwrap(), "wss://h/a?ws");
    }

    #[test]
    fn test_existing_query_kept() {
        assert_eq!(admin_endpoint("ws://h/a?ws").unwrap(), "ws://h/a?ws");
        assert_eq!(admin_endpoint("http://h/a?x=1").unwrap(), "ws://h/a?x=1");
    }

    #[test]
    fn test_fragment_dropped() {
        assert_eq!(admin_endpoint("http://h/a#top").unwrap(), "ws://h/a?ws");
    }

    #[test]
    fn test_invalid_endpoints() {
        for url in ["", "localhost:8080", "ftp://h/", "http://", "http:///path"] {
            assert!(
                matches!(admin_endpoint(url), Err(TransportError::InvalidEndpoint(_))),
                "{url} should be rejected"
            );
        }
    }
}
