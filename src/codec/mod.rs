//! Wire codec for the admin channel.
//!
//! Every integer on the wire is big-endian. Text travels either in
//! fixed-capacity NUL-padded fields or as a u64 length followed by raw bytes.
//! Decoding never panics: reading past the end of a buffer is a
//! [`DecodeError`], and writing past the end of one is an [`EncodeError`].

mod error;

pub use error::{DecodeError, EncodeError};

use bytes::BufMut;

/// Capacity of each text field in a request log record.
pub const MAX_LOG_STR_LEN: usize = 128;

fn window(bytes: &[u8], offset: usize, needed: usize) -> Result<&[u8], DecodeError> {
    let available = bytes.len().saturating_sub(offset);
    if available < needed {
        return Err(DecodeError::Truncated {
            offset,
            needed,
            available,
        });
    }
    Ok(&bytes[offset..offset + needed])
}

/// Read a single byte at `offset`.
pub fn decode_u8(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    Ok(window(bytes, offset, 1)?[0])
}

/// Interpret 2 bytes at `offset` as a big-endian u16.
pub fn decode_u16(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(window(bytes, offset, 2)?);
    Ok(u16::from_be_bytes(raw))
}

/// Interpret 8 bytes at `offset` as a big-endian u64.
///
/// # Examples
///
/// ```
/// use telewire::codec::decode_u64;
///
/// let bytes = [0, 0, 0, 0, 0, 0, 1, 0];
/// assert_eq!(decode_u64(&bytes, 0).unwrap(), 256);
/// assert!(decode_u64(&bytes, 1).is_err());
/// ```
pub fn decode_u64(bytes: &[u8], offset: usize) -> Result<u64, DecodeError> {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(window(bytes, offset, 8)?);
    Ok(u64::from_be_bytes(raw))
}

/// Write `value` as 8 big-endian bytes at `offset`, overwriting exactly
/// those 8 bytes.
pub fn encode_u64(value: u64, bytes: &mut [u8], offset: usize) -> Result<(), EncodeError> {
    let len = bytes.len();
    match bytes.get_mut(offset..offset.saturating_add(8)) {
        Some(slot) if slot.len() == 8 => {
            slot.copy_from_slice(&value.to_be_bytes());
            Ok(())
        }
        _ => Err(EncodeError::OutOfBounds {
            offset,
            needed: 8,
            len,
        }),
    }
}

/// Decode a NUL-terminated text field of fixed `capacity`.
///
/// The full capacity must be present. Only those bytes are scanned; anything
/// after the first NUL is ignored. Invalid UTF-8 becomes U+FFFD instead of
/// failing the frame.
pub fn decode_fixed_text(bytes: &[u8], offset: usize, capacity: usize) -> Result<String, DecodeError> {
    let field = window(bytes, offset, capacity)?;
    let end = field.iter().position(|b| *b == 0).unwrap_or(capacity);
    Ok(String::from_utf8_lossy(&field[..end]).into_owned())
}

/// Read a u64 length at `offset` followed by that many raw bytes.
///
/// Returns the bytes and the offset just past them.
pub fn decode_length_prefixed(bytes: &[u8], offset: usize) -> Result<(&[u8], usize), DecodeError> {
    let declared = decode_u64(bytes, offset)?;
    let start = offset + 8;
    let remaining = bytes.len() - start;
    if declared > remaining as u64 {
        return Err(DecodeError::LengthOverflow {
            declared,
            remaining,
        });
    }
    let end = start + declared as usize;
    Ok((&bytes[start..end], end))
}

/// Write `text` into a NUL-padded field of `capacity` bytes.
///
/// Text longer than the field is cut at the last char boundary that fits.
pub fn put_fixed_text(dst: &mut impl BufMut, text: &str, capacity: usize) {
    let mut end = text.len().min(capacity);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    dst.put_slice(&text.as_bytes()[..end]);
    dst.put_bytes(0, capacity - end);
}

/// Write a u64 length followed by `bytes`.
pub fn put_length_prefixed(dst: &mut impl BufMut, bytes: &[u8]) {
    dst.put_u64(bytes.len() as u64);
    dst.put_slice(bytes);
}

/// Cursor over a frame payload.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        let value = decode_u8(self.buf, self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        let value = decode_u16(self.buf, self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    pub fn u64(&mut self) -> Result<u64, DecodeError> {
        let value = decode_u64(self.buf, self.pos)?;
        self.pos += 8;
        Ok(value)
    }

    pub fn fixed_text(&mut self, capacity: usize) -> Result<String, DecodeError> {
        let value = decode_fixed_text(self.buf, self.pos, capacity)?;
        self.pos += capacity;
        Ok(value)
    }

    pub fn length_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let (bytes, next) = decode_length_prefixed(self.buf, self.pos)?;
        self.pos = next;
        Ok(bytes)
    }

    /// Read a u64 record count and check that `count` records of
    /// `record_size` bytes fit in what is left of the payload.
    pub fn count(&mut self, record_size: usize) -> Result<usize, DecodeError> {
        let count = self.u64()?;
        let remaining = self.remaining();
        let fits = match record_size {
            0 => count <= remaining as u64,
            size => count <= (remaining / size) as u64,
        };
        if !fits {
            return Err(DecodeError::CountOverflow { count, remaining });
        }
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_u16_big_endian() {
        assert_eq!(decode_u16(&[0x01, 0xF4], 0).unwrap(), 500);
    }

    #[test]
    fn test_decode_u64_truncated() {
        let err = decode_u64(&[0u8; 7], 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 0,
                needed: 8,
                available: 7
            }
        );
    }

    #[test]
    fn test_decode_u64_offset_past_end() {
        assert!(decode_u64(&[0u8; 8], 20).is_err());
    }

    #[test]
    fn test_encode_u64_zero_fills_high_bytes() {
        let mut buf = [0xFFu8; 10];
        encode_u64(0x0102, &mut buf, 1).unwrap();
        assert_eq!(buf, [0xFF, 0, 0, 0, 0, 0, 0, 0x01, 0x02, 0xFF]);
    }

    #[test]
    fn test_encode_u64_out_of_bounds() {
        let mut buf = [0u8; 8];
        assert!(encode_u64(1, &mut buf, 1).is_err());
        assert!(encode_u64(1, &mut buf, usize::MAX).is_err());
    }

    #[test]
    fn test_fixed_text_stops_at_nul() {
        let mut buf = b"hello\0garbage".to_vec();
        buf.resize(16, 0);
        assert_eq!(decode_fixed_text(&buf, 0, 16).unwrap(), "hello");
    }

    #[test]
    fn test_fixed_text_without_nul_uses_capacity() {
        let buf = b"abcdefgh";
        assert_eq!(decode_fixed_text(buf, 0, 4).unwrap(), "abcd");
    }

    #[test]
    fn test_fixed_text_invalid_utf8_is_replaced() {
        let buf = [b'o', b'k', 0xFF, 0xFE, 0];
        let text = decode_fixed_text(&buf, 0, 5).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_fixed_text_requires_full_capacity() {
        assert!(decode_fixed_text(b"short\0", 0, 128).is_err());
    }

    #[test]
    fn test_length_prefixed_overflow() {
        let mut buf = Vec::new();
        buf.put_u64(10);
        buf.put_slice(b"abc");
        assert_eq!(
            decode_length_prefixed(&buf, 0).unwrap_err(),
            DecodeError::LengthOverflow {
                declared: 10,
                remaining: 3
            }
        );
    }

    #[test]
    fn test_length_prefixed_returns_next_offset() {
        let mut buf = vec![0xAA];
        put_length_prefixed(&mut buf, b"label");
        buf.push(0xBB);
        let (bytes, next) = decode_length_prefixed(&buf, 1).unwrap();
        assert_eq!(bytes, b"label");
        assert_eq!(buf[next], 0xBB);
    }

    #[test]
    fn test_put_fixed_text_truncates_on_char_boundary() {
        let mut buf = Vec::new();
        put_fixed_text(&mut buf, "aé", 2);
        assert_eq!(buf, vec![b'a', 0]);
    }

    #[test]
    fn test_reader_count_rejects_oversized() {
        let mut buf = Vec::new();
        buf.put_u64(3);
        buf.put_bytes(0, 16);
        let mut reader = Reader::new(&buf);
        assert!(matches!(
            reader.count(8),
            Err(DecodeError::CountOverflow { count: 3, .. })
        ));
    }

    #[test]
    fn test_reader_tracks_position() {
        let mut buf = Vec::new();
        buf.put_u8(7);
        buf.put_u16(300);
        buf.put_u64(42);
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.u8().unwrap(), 7);
        assert_eq!(reader.u16().unwrap(), 300);
        assert_eq!(reader.u64().unwrap(), 42);
        assert_eq!(reader.position(), 11);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.u8().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_u64_round_trip(value in any::<u64>(), offset in 0usize..8) {
                let mut buf = vec![0u8; offset + 8];
                encode_u64(value, &mut buf, offset).unwrap();
                prop_assert_eq!(decode_u64(&buf, offset).unwrap(), value);
            }

            /// Bytes past the field capacity never leak into the decoded text.
            #[test]
            fn prop_fixed_text_bounded_by_capacity(
                field in proptest::collection::vec(any::<u8>(), 0..64),
                tail in proptest::collection::vec(1u8..=255, 1..32),
                capacity in 1usize..64,
            ) {
                let mut buf = field.clone();
                buf.resize(capacity.max(field.len()), 0);
                buf.extend_from_slice(&tail);

                let text = decode_fixed_text(&buf, 0, capacity).unwrap();

                let within = &buf[..capacity];
                let end = within.iter().position(|b| *b == 0).unwrap_or(capacity);
                prop_assert_eq!(text, String::from_utf8_lossy(&within[..end]).into_owned());
            }
        }
    }
}
