//! Admin channel message definitions.
//!
//! Byte 0 of every frame is an opcode. Several opcodes are spoken in both
//! directions with different payloads, so messages are split by direction:
//! [`ClientMessage`] is what this client sends, [`ServerMessage`] is what
//! the server answers. Which enum applies is decided by who is reading the
//! channel, never by the byte itself.
//!
//! # Layouts (big-endian)
//!
//! ```text
//! client → server
//!   [0][cursor u64][kind u64 = 29]      stats snapshot
//!   [2][cursor u64][kind u64 = 30]      older stats page
//!   [1]                                 ping
//!   [3][cursor u64]                     most recent requests
//!   [4]                                 chart
//!   [9][tag][len u64][pattern][id u64][flag][len u64][label]
//!   [10]                                get rules
//!   [12][count u64 <= 255][id u64 ...]  set active rules
//!
//! server → client
//!   [0][server_time][count][StatEntry ...]        stats snapshot or page
//!   [1][server_time][count][StatEntry ...]        pong
//!   [3][server_time][count][RequestLogEntry ...]  recent requests
//!   [4][server_time][count][ChartPoint ...]       chart
//!   [9][id u64]                                   rule created
//!   [10][reserved u64][count u64][RuleListing ...]
//! ```

mod frame;
pub mod records;
pub mod rules;


pub use frame::{frame, split};
pub use records::{
    Batch, ChartPoint, HttpMethod, HttpVersion, Record, RequestLogEntry, StatEntry,
};
pub use rules::{NewRule, RuleDescriptor, RuleListing, PATTERN_RULE_TAG};

use bytes::{BufMut, Bytes};

use thiserror::Error;

use crate::codec::{DecodeError, Reader};

/// Largest active rule set one request can carry.
pub const MAX_ACTIVE_RULES: usize = 255;

/// An active set too large for its one-byte-bounded count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("too many ids for one active set: {count} (max {max})")]
pub struct TooManyIds {
    pub count: usize,
    pub max: usize,
}

/// Assigned opcodes. Values not listed here are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Stats snapshot request and every stats response
    Stats = 0,
    /// Ping from the client, pong from the server
    Ping = 1,
    /// Older stats page request
    StatsByCursor = 2,
    MostRecentRequests = 3,
    Chart = 4,
    CreateRule = 9,
    GetRules = 10,
    /// Fire-and-forget; the server never answers it
    SetActiveRules = 12,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stats),
            1 => Some(Self::Ping),
            2 => Some(Self::StatsByCursor),
            3 => Some(Self::MostRecentRequests),
            4 => Some(Self::Chart),
            9 => Some(Self::CreateRule),
            10 => Some(Self::GetRules),
            12 => Some(Self::SetActiveRules),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Trailing discriminator of stats requests. The server tells a first
/// snapshot from a pagination request by this value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsQueryKind {
    Initial,
    Older,
}

impl StatsQueryKind {
    pub const INITIAL: u64 = 29;
    pub const OLDER: u64 = 30;

    pub fn as_u64(self) -> u64 {
        match self {
            Self::Initial => Self::INITIAL,
            Self::Older => Self::OLDER,
        }
    }

    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            Self::INITIAL => Some(Self::Initial),
            Self::OLDER => Some(Self::Older),
            _ => None,
        }
    }

    fn opcode(self) -> Opcode {
        match self {
            Self::Initial => Opcode::Stats,
            Self::Older => Opcode::StatsByCursor,
        }
    }
}

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Stats by interval timestamp cursor
    StatsQuery { cursor: u64, kind: StatsQueryKind },
    Ping,
    /// Request log entries completed strictly after `cursor` (microseconds)
    RecentRequests { cursor: u64 },
    Chart,
    CreateRule(NewRule),
    GetRules,
    /// Replaces the server's whole active set
    SetActiveRules(Vec<u64>),
}

impl ClientMessage {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::StatsQuery { kind, .. } => kind.opcode(),
            Self::Ping => Opcode::Ping,
            Self::RecentRequests { .. } => Opcode::MostRecentRequests,
            Self::Chart => Opcode::Chart,
            Self::CreateRule(_) => Opcode::CreateRule,
            Self::GetRules => Opcode::GetRules,
            Self::SetActiveRules(_) => Opcode::SetActiveRules,
        }
    }

    /// Encode into one frame.
    ///
    /// Only an oversized active set can fail.
    pub fn encode(&self) -> Result<Bytes, TooManyIds> {
        if let Self::SetActiveRules(ids) = self {
            if ids.len() > MAX_ACTIVE_RULES {
                return Err(TooManyIds {
                    count: ids.len(),
                    max: MAX_ACTIVE_RULES,
                });
            }
        }

        Ok(frame(self.opcode(), |buf| match self {
            Self::StatsQuery { cursor, kind } => {
                buf.put_u64(*cursor);
                buf.put_u64(kind.as_u64());
            }
            Self::RecentRequests { cursor } => buf.put_u64(*cursor),
            Self::CreateRule(rule) => rule.encode(buf),
            Self::SetActiveRules(ids) => {
                buf.put_u64(ids.len() as u64);
                for id in ids {
                    buf.put_u64(*id);
                }
            }
            Self::Ping | Self::Chart | Self::GetRules => {}
        }))
    }

    /// Decode a frame written by a client. Used by servers and test fakes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (raw, payload) = split(bytes)?;
        let opcode = Opcode::from_u8(raw).ok_or(DecodeError::UnknownOpcode(raw))?;
        let mut reader = Reader::new(payload);

        match opcode {
            Opcode::Stats | Opcode::StatsByCursor => {
                let cursor = reader.u64()?;
                let raw_kind = reader.u64()?;
                let kind = StatsQueryKind::from_u64(raw_kind)
                    .ok_or(DecodeError::UnknownQueryKind(raw_kind))?;
                Ok(Self::StatsQuery { cursor, kind })
            }
            Opcode::Ping => Ok(Self::Ping),
            Opcode::MostRecentRequests => Ok(Self::RecentRequests {
                cursor: reader.u64()?,
            }),
            Opcode::Chart => Ok(Self::Chart),
            Opcode::CreateRule => Ok(Self::CreateRule(NewRule::decode(&mut reader)?)),
            Opcode::GetRules => Ok(Self::GetRules),
            Opcode::SetActiveRules => {
                let count = reader.count(8)?;
                let mut ids = Vec::with_capacity(count);
                for _ in 0..count {
                    ids.push(reader.u64()?);
                }
                Ok(Self::SetActiveRules(ids))
            }
        }
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Snapshot or older page, oldest first
    Stats(Batch<StatEntry>),
    /// Reply to a ping, carrying the latest intervals
    Pong(Batch<StatEntry>),
    RecentRequests(Batch<RequestLogEntry>),
    Chart(Batch<ChartPoint>),
    RuleCreated { id: u64 },
    Rules(Vec<RuleListing>),
}

impl ServerMessage {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Stats(_) => Opcode::Stats,
            Self::Pong(_) => Opcode::Ping,
            Self::RecentRequests(_) => Opcode::MostRecentRequests,
            Self::Chart(_) => Opcode::Chart,
            Self::RuleCreated { .. } => Opcode::CreateRule,
            Self::Rules(_) => Opcode::GetRules,
        }
    }

    /// Decode the payload of a frame whose opcode byte is `raw`.
    pub fn decode_payload(raw: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        let opcode = Opcode::from_u8(raw).ok_or(DecodeError::UnknownOpcode(raw))?;
        let mut reader = Reader::new(payload);

        match opcode {
            Opcode::Stats => Ok(Self::Stats(Batch::decode(&mut reader)?)),
            Opcode::Ping => Ok(Self::Pong(Batch::decode(&mut reader)?)),
            Opcode::MostRecentRequests => Ok(Self::RecentRequests(Batch::decode(&mut reader)?)),
            Opcode::Chart => Ok(Self::Chart(Batch::decode(&mut reader)?)),
            Opcode::CreateRule => Ok(Self::RuleCreated {
                id: reader.u64()?,
            }),
            Opcode::GetRules => {
                let _reserved = reader.u64()?;
                let count = reader.u64()?;
                // Smallest listing: id, tag, length, flag, active, label length
                let min_size = 8 + 1 + 8 + 1 + 1 + 8;
                if count > (reader.remaining() / min_size) as u64 {
                    return Err(DecodeError::CountOverflow {
                        count,
                        remaining: reader.remaining(),
                    });
                }
                let mut rules = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    rules.push(RuleListing::decode(&mut reader)?);
                }
                Ok(Self::Rules(rules))
            }
            Opcode::StatsByCursor | Opcode::SetActiveRules => Err(DecodeError::UnknownOpcode(raw)),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (raw, payload) = split(bytes)?;
        Self::decode_payload(raw, payload)
    }

    /// Encode into one frame. Used by servers and test fakes.
    pub fn encode(&self) -> Bytes {
        frame(self.opcode(), |buf| match self {
            Self::Stats(batch) | Self::Pong(batch) => batch.encode(buf),
            Self::RecentRequests(batch) => batch.encode(buf),
            Self::Chart(batch) => batch.encode(buf),
            Self::RuleCreated { id } => buf.put_u64(*id),
            Self::Rules(rules) => {
                buf.put_u64(0);
                buf.put_u64(rules.len() as u64);
                for rule in rules {
                    rule.encode(buf);
                }
            }
        })
    }
}
