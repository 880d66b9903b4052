//! Codec error types

use thiserror::Error;

/// Errors raised while decoding a frame payload.
///
/// Any of these aborts the whole frame: nothing decoded from it is merged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("declared length {declared} exceeds the {remaining} bytes remaining")]
    LengthOverflow { declared: u64, remaining: usize },

    #[error("record count {count} cannot fit in {remaining} remaining bytes")]
    CountOverflow { count: u64, remaining: usize },

    #[error("empty frame")]
    EmptyFrame,

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("unknown stats query kind: {0}")]
    UnknownQueryKind(u64),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(u8),

    #[error("unknown rule descriptor tag: {0}")]
    UnknownRuleTag(u8),

    #[error("unexpected opcode {actual}, expected {expected}")]
    UnexpectedOpcode { expected: u8, actual: u8 },

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Errors raised while encoding into a caller-supplied buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("write of {needed} bytes at offset {offset} overruns buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },
}
