//! Connection lifecycle state machine.

use std::fmt;

use tokio::sync::watch;

use super::error::LifecycleError;

/// Liveness of a session's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    /// Terminal; there is no reconnect
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// `Connecting -> Open -> Closed`, published through a watch channel.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<ConnectionState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Connecting);
        Self { tx }
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// The channel is up. Only valid while connecting.
    pub fn open(&self) -> Result<(), LifecycleError> {
        self.transition(ConnectionState::Open)
    }

    /// Valid from any state; closing twice is a no-op.
    pub fn close(&self) {
        let changed = self.tx.send_if_modified(|state| {
            let was_open = *state != ConnectionState::Closed;
            *state = ConnectionState::Closed;
            was_open
        });
        if changed {
            tracing::debug!("Admin channel closed");
        }
    }

    fn transition(&self, to: ConnectionState) -> Result<(), LifecycleError> {
        let from = self.state();
        let allowed = matches!(
            (from, to),
            (ConnectionState::Connecting, ConnectionState::Open)
        );
        if !allowed {
            return Err(LifecycleError::InvalidTransition { from, to });
        }
        self.tx.send_replace(to);
        tracing::debug!(%from, %to, "Connection state changed");
        Ok(())
    }
}
