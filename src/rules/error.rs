//! Rule administration error types

use std::time::Duration;

use thiserror::Error;

use crate::protocol::TooManyIds;
use crate::exchange::ExchangeError;
use crate::transport::TransportError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The active set is larger than one request can carry
    #[error("too many rules to activate: {count} (max {max})")]
    TooManyRules { count: usize, max: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no response from server within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("channel closed before the server responded")]
    ChannelClosed,

    #[error("unexpected response with opcode {0}")]
    UnexpectedResponse(u8),
}

impl From<ExchangeError> for RuleError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Transport(e) => Self::Transport(e),
            ExchangeError::Encode(TooManyIds { count, max }) => Self::TooManyRules { count, max },
            ExchangeError::Timeout(limit) => Self::Timeout(limit),
            ExchangeError::ChannelClosed => Self::ChannelClosed,
            ExchangeError::UnexpectedResponse(opcode) => Self::UnexpectedResponse(opcode),
        }
    }
}
