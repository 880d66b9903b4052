//! In-process transport.
//!
//! Two [`MemoryTransport`]s joined by unbounded channels. Dropping or
//! closing one end makes the other end's `recv` return `None`.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::{Connector, Transport, TransportError};

#[derive(Debug)]
pub struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    rx: mpsc::UnboundedReceiver<Bytes>,
}

impl MemoryTransport {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(a_tx),
                rx: b_rx,
            },
            Self {
                tx: Some(b_tx),
                rx: a_rx,
            },
        )
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame)
            .map_err(|_| TransportError::Send("peer dropped".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Bytes, TransportError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

/// Connector that hands the server end of every new channel to a receiver.
///
/// Whoever holds the receiver plays the server. A connect fails once the
/// receiver is dropped.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryTransport>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryTransport>) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        (Self { accept_tx }, accept_rx)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Transport = MemoryTransport;

    async fn connect(&self) -> Result<Self::Transport, TransportError> {
        let (client, server) = MemoryTransport::pair();
        self.accept_tx
            .send(server)
            .map_err(|_| TransportError::Connect {
                endpoint: self.endpoint().to_string(),
                reason: "no server listening".to_string(),
            })?;
        Ok(client)
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}
