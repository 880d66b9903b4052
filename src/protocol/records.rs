//! Fixed-size telemetry records carried in stats, request log and chart
//! batches.

use bytes::BufMut;
use serde::Serialize;
use std::fmt;

use crate::codec::{put_fixed_text, DecodeError, Reader, MAX_LOG_STR_LEN};

/// A record with a fixed wire size that can appear in a [`Batch`].
pub trait Record: Sized {
    /// Encoded size in bytes.
    const WIRE_SIZE: usize;

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError>;

    fn encode(&self, dst: &mut impl BufMut);
}

/// `server_time` + `count` + `count` records, the shape shared by every
/// telemetry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Server wall clock in milliseconds when the response was built
    pub server_time: u64,
    pub records: Vec<T>,
}

impl<T: Record> Batch<T> {
    pub fn new(server_time: u64, records: Vec<T>) -> Self {
        Self {
            server_time,
            records,
        }
    }

    /// Decode a whole batch. Fails without partial output if any record is
    /// truncated or invalid.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let server_time = reader.u64()?;
        let count = reader.count(T::WIRE_SIZE)?;
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(T::decode(reader)?);
        }
        Ok(Self {
            server_time,
            records,
        })
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u64(self.server_time);
        dst.put_u64(self.records.len() as u64);
        for record in &self.records {
            record.encode(dst);
        }
    }
}

/// Server health counters for one reporting interval.
///
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatEntry {
    pub requests: u64,
    pub dropped_log: u64,
    pub connections: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub connect_timeouts: u64,
    pub read_timeouts: u64,
    /// End of the interval
    pub timestamp: u64,
    /// Start of the interval
    pub prev_timestamp: u64,
    /// Process start time
    pub startup_time: u64,
    pub latency_sum_micros: u64,
    pub memory_bytes: u64,
}

impl StatEntry {
    /// Average request latency in microseconds, 0 for an idle interval.
    pub fn average_latency_micros(&self) -> u64 {
        if self.requests == 0 {
            0
        } else {
            self.latency_sum_micros / self.requests
        }
    }
}

impl Record for StatEntry {
    const WIRE_SIZE: usize = 96;

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let entry = Self {
            requests: reader.u64()?,
            dropped_log: reader.u64()?,
            connections: reader.u64()?,
            connects: reader.u64()?,
            disconnects: reader.u64()?,
            connect_timeouts: reader.u64()?,
            read_timeouts: reader.u64()?,
            timestamp: reader.u64()?,
            prev_timestamp: reader.u64()?,
            startup_time: reader.u64()?,
            latency_sum_micros: reader.u64()?,
            memory_bytes: reader.u64()?,
        };

        if entry.timestamp < entry.prev_timestamp || entry.prev_timestamp < entry.startup_time {
            return Err(DecodeError::InvalidRecord(format!(
                "stat interval out of order: startup {} prev {} timestamp {}",
                entry.startup_time, entry.prev_timestamp, entry.timestamp
            )));
        }

        Ok(entry)
    }

    fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u64(self.requests);
        dst.put_u64(self.dropped_log);
        dst.put_u64(self.connections);
        dst.put_u64(self.connects);
        dst.put_u64(self.disconnects);
        dst.put_u64(self.connect_timeouts);
        dst.put_u64(self.read_timeouts);
        dst.put_u64(self.timestamp);
        dst.put_u64(self.prev_timestamp);
        dst.put_u64(self.startup_time);
        dst.put_u64(self.latency_sum_micros);
        dst.put_u64(self.memory_bytes);
    }
}

/// HTTP method of a logged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Connect,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Get),
            1 => Some(Self::Post),
            2 => Some(Self::Put),
            3 => Some(Self::Delete),
            4 => Some(Self::Head),
            5 => Some(Self::Options),
            6 => Some(Self::Connect),
            7 => Some(Self::Patch),
            8 => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        };
        f.write_str(name)
    }
}

/// HTTP protocol version of a logged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpVersion {
    Unknown,
    Http10,
    Http11,
    Http20,
}

impl HttpVersion {
    /// Values outside the known range map to `Unknown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Http10,
            2 => Self::Http11,
            3 => Self::Http20,
            _ => Self::Unknown,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Http10 => 1,
            Self::Http11 => 2,
            Self::Http20 => 3,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
            Self::Http20 => "HTTP/2.0",
        };
        f.write_str(name)
    }
}

/// One request handled by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLogEntry {
    pub method: HttpMethod,
    pub version: HttpVersion,
    pub content_length: u64,
    pub start_micros: u64,
    pub end_micros: u64,
    pub status: u16,
    /// URI that was actually served
    pub uri: String,
    pub query: String,
    pub user_agent: String,
    pub referer: String,
    /// URI as sent by the client, before any rewrite
    pub uri_requested: String,
}

impl RequestLogEntry {
    pub fn latency_micros(&self) -> u64 {
        self.end_micros.saturating_sub(self.start_micros)
    }
}

impl Record for RequestLogEntry {
    const WIRE_SIZE: usize = 1 + 1 + 8 + 8 + 8 + 2 + 5 * MAX_LOG_STR_LEN;

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let raw_method = reader.u8()?;
        let method = HttpMethod::from_u8(raw_method).ok_or(DecodeError::UnknownMethod(raw_method))?;
        let version = HttpVersion::from_u8(reader.u8()?);
        let content_length = reader.u64()?;
        let start_micros = reader.u64()?;
        let end_micros = reader.u64()?;
        let status = reader.u16()?;

        if end_micros < start_micros {
            return Err(DecodeError::InvalidRecord(format!(
                "request ends at {} before it starts at {}",
                end_micros, start_micros
            )));
        }

        Ok(Self {
            method,
            version,
            content_length,
            start_micros,
            end_micros,
            status,
            uri: reader.fixed_text(MAX_LOG_STR_LEN)?,
            query: reader.fixed_text(MAX_LOG_STR_LEN)?,
            user_agent: reader.fixed_text(MAX_LOG_STR_LEN)?,
            referer: reader.fixed_text(MAX_LOG_STR_LEN)?,
            uri_requested: reader.fixed_text(MAX_LOG_STR_LEN)?,
        })
    }

    fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.method.as_u8());
        dst.put_u8(self.version.as_u8());
        dst.put_u64(self.content_length);
        dst.put_u64(self.start_micros);
        dst.put_u64(self.end_micros);
        dst.put_u16(self.status);
        put_fixed_text(dst, &self.uri, MAX_LOG_STR_LEN);
        put_fixed_text(dst, &self.query, MAX_LOG_STR_LEN);
        put_fixed_text(dst, &self.user_agent, MAX_LOG_STR_LEN);
        put_fixed_text(dst, &self.referer, MAX_LOG_STR_LEN);
        put_fixed_text(dst, &self.uri_requested, MAX_LOG_STR_LEN);
    }
}

/// One aggregation bucket of the chart response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChartPoint {
    pub requests: u64,
    pub latency_sum: u64,
    pub connects: u64,
    /// Bucket end, Unix milliseconds
    pub end: u64,
    /// Bucket start, Unix milliseconds
    pub start: u64,
    pub memory_bytes: u64,
}

impl Record for ChartPoint {
    const WIRE_SIZE: usize = 48;

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            requests: reader.u64()?,
            latency_sum: reader.u64()?,
            connects: reader.u64()?,
            end: reader.u64()?,
            start: reader.u64()?,
            memory_bytes: reader.u64()?,
        })
    }

    fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u64(self.requests);
        dst.put_u64(self.latency_sum);
        dst.put_u64(self.connects);
        dst.put_u64(self.end);
        dst.put_u64(self.start);
        dst.put_u64(self.memory_bytes);
    }
}
