//! Inbound frame dispatch.
//!
//! A [`Dispatcher`] maps opcode bytes to handlers that decode the payload
//! and apply it to some state `S`. Frames with no registered handler and
//! frames whose handler fails to decode are logged, counted and dropped;
//! the caller keeps the connection open either way.

use std::collections::HashMap;
use std::fmt;

use crate::codec::DecodeError;
use crate::protocol::{split, Opcode};

type Handler<S> = Box<dyn Fn(&mut S, &[u8]) -> Result<(), DecodeError> + Send + Sync>;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler decoded the payload and applied it
    Handled(Opcode),
    /// No handler is registered for this byte
    UnknownOpcode(u8),
    /// The frame was empty or its payload failed to decode
    Malformed(DecodeError),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Opcode to handler table.
pub struct Dispatcher<S> {
    handlers: HashMap<u8, Handler<S>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut opcodes: Vec<_> = self.handlers.keys().collect();
        opcodes.sort();
        f.debug_struct("Dispatcher")
            .field("opcodes", &opcodes)
            .finish()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `opcode`, replacing any previous one.
    ///
    /// The handler must decode the whole payload before touching the state,
    /// so a decode error leaves the state as it was.
    pub fn register<F>(&mut self, opcode: Opcode, handler: F) -> &mut Self
    where
        F: Fn(&mut S, &[u8]) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.handlers.insert(opcode.as_u8(), Box::new(handler));
        self
    }

    pub fn handles(&self, opcode: Opcode) -> bool {
        self.handlers.contains_key(&opcode.as_u8())
    }

    /// Route one inbound frame to its handler.
    pub fn dispatch(&self, state: &mut S, frame: &[u8]) -> DispatchOutcome {
        let (raw, payload) = match split(frame) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping empty frame");
                metrics::counter!("telewire_frames_dropped_total", "reason" => "empty")
                    .increment(1);
                return DispatchOutcome::Malformed(e);
            }
        };

        metrics::counter!("telewire_frames_total", "opcode" => raw.to_string()).increment(1);

        let (opcode, handler) = match (Opcode::from_u8(raw), self.handlers.get(&raw)) {
            (Some(opcode), Some(handler)) => (opcode, handler),
            _ => {
                tracing::warn!(opcode = raw, len = frame.len(), "Dropping frame with unknown opcode");
                metrics::counter!("telewire_frames_dropped_total", "reason" => "unknown_opcode")
                    .increment(1);
                return DispatchOutcome::UnknownOpcode(raw);
            }
        };

        match handler(state, payload) {
            Ok(()) => {
                tracing::trace!(opcode = raw, len = frame.len(), "Frame handled");
                DispatchOutcome::Handled(opcode)
            }
            Err(e) => {
                tracing::warn!(opcode = raw, error = %e, "Dropping malformed frame");
                metrics::counter!("telewire_frames_dropped_total", "reason" => "malformed")
                    .increment(1);
                DispatchOutcome::Malformed(e)
            }
        }
    }
}
