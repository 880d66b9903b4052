//! WebSocket transport built on `tokio-tungstenite`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{Connector, Transport, TransportError};

/// Opens plain `ws://` channels to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: String,
}

impl WsConnector {
    /// `endpoint` is a complete channel URL, usually from
    /// [`admin_endpoint`](super::admin_endpoint).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport<MaybeTlsStream<TcpStream>>;

    async fn connect(&self) -> Result<Self::Transport, TransportError> {
        if self.endpoint.starts_with("wss://") {
            return Err(TransportError::TlsUnsupported(self.endpoint.clone()));
        }

        let (stream, response) = tokio_tungstenite::connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            endpoint = %self.endpoint,
            status = response.status().as_u16(),
            "WebSocket handshake complete"
        );

        Ok(WsTransport::new(stream))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// A WebSocket carrying one frame per binary message.
///
/// Text messages are not part of the protocol and are skipped with a
/// warning. Control messages are handled by tungstenite.
pub struct WsTransport<S> {
    stream: WebSocketStream<S>,
    closed: bool,
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream, client or server side.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.stream
            .send(Message::Binary(frame.to_vec()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Bytes, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
                Ok(Message::Text(text)) => {
                    tracing::warn!(len = text.len(), "Ignoring text message on admin channel");
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Peer closed admin channel");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None
                }
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(TransportError::Send(e.to_string())),
        }
    }
}
