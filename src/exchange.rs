//! One-shot request/response exchanges.
//!
//! Each exchange opens a dedicated channel, sends one request, waits for
//! the first response carrying the expected opcode and closes the channel.
//! Frames with other opcodes and frames that fail to decode are logged and
//! skipped while waiting.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::{split, ClientMessage, Opcode, ServerMessage, TooManyIds};
use crate::sync::ChartSeries;
use crate::transport::{Connector, Transport, TransportError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encode(#[from] TooManyIds),

    #[error("no response within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("channel closed before a response arrived")]
    ChannelClosed,

    #[error("unexpected response with opcode {0}")]
    UnexpectedResponse(u8),
}

/// Send `request` on a fresh channel and return the first response with
/// opcode `expect`.
///
/// Without a `timeout` the wait is unbounded.
pub async fn exchange<C: Connector>(
    connector: &C,
    request: &ClientMessage,
    expect: Opcode,
    timeout: Option<Duration>,
) -> Result<ServerMessage, ExchangeError> {
    let frame = request.encode()?;
    let mut transport = connector.connect().await?;

    let result = match transport.send(frame).await {
        Ok(()) => match timeout {
            Some(limit) => tokio::time::timeout(limit, wait_for(&mut transport, expect))
                .await
                .unwrap_or(Err(ExchangeError::Timeout(limit))),
            None => wait_for(&mut transport, expect).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = transport.close().await {
        tracing::debug!(error = %e, "Error while closing exchange channel");
    }
    result
}

/// Send `request` on a fresh channel and close it without waiting.
pub async fn fire_and_forget<C: Connector>(
    connector: &C,
    request: &ClientMessage,
) -> Result<(), ExchangeError> {
    let frame = request.encode()?;
    let mut transport = connector.connect().await?;
    let sent = transport.send(frame).await;
    if let Err(e) = transport.close().await {
        tracing::debug!(error = %e, "Error while closing exchange channel");
    }
    Ok(sent?)
}

async fn wait_for<T: Transport>(transport: &mut T, expect: Opcode) -> Result<ServerMessage, ExchangeError> {
    loop {
        let frame = match transport.recv().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ExchangeError::ChannelClosed),
        };

        let (raw, payload) = match split(&frame) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed frame");
                continue;
            }
        };

        if raw != expect.as_u8() {
            tracing::warn!(
                opcode = raw,
                expected = expect.as_u8(),
                "Skipping frame while waiting for response"
            );
            continue;
        }

        match ServerMessage::decode_payload(raw, payload) {
            Ok(message) => return Ok(message),
            Err(e) => tracing::warn!(opcode = raw, error = %e, "Skipping malformed response"),
        }
    }
}

/// Fetch the aggregated chart once.
pub async fn fetch_chart<C: Connector>(
    connector: &C,
    timeout: Option<Duration>,
) -> Result<ChartSeries, ExchangeError> {
    match exchange(connector, &ClientMessage::Chart, Opcode::Chart, timeout).await? {
        ServerMessage::Chart(batch) => {
            tracing::debug!(
                points = batch.records.len(),
                server_time = batch.server_time,
                "Chart received"
            );
            Ok(ChartSeries::from_points(&batch.records))
        }
        other => Err(ExchangeError::UnexpectedResponse(other.opcode().as_u8())),
    }
}
