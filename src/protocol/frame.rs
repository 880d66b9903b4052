//! Opcode framing.
//!
//! The transport preserves message boundaries, so a frame is just the opcode
//! byte followed by the payload. No length header is added.

use bytes::{BufMut, Bytes, BytesMut};

use super::Opcode;
use crate::codec::DecodeError;

/// Build one outbound frame: `opcode` followed by whatever `build` writes.
///
/// # Examples
///
/// ```
/// use bytes::BufMut;
/// use telewire::protocol::{frame, Opcode};
///
/// let bytes = frame(Opcode::MostRecentRequests, |buf| buf.put_u64(7));
/// assert_eq!(bytes.len(), 9);
/// assert_eq!(bytes[0], 3);
/// ```
pub fn frame(opcode: Opcode, build: impl FnOnce(&mut BytesMut)) -> Bytes {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_u8(opcode.as_u8());
    build(&mut buf);
    buf.freeze()
}

/// Split an inbound frame into its raw opcode byte and payload.
pub fn split(frame: &[u8]) -> Result<(u8, &[u8]), DecodeError> {
    match frame.split_first() {
        Some((opcode, payload)) => Ok((*opcode, payload)),
        None => Err(DecodeError::EmptyFrame),
    }
}
