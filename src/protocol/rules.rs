//! Rule descriptors and the records exchanged by the rule administration
//! messages.
//!
//! The descriptor is owned by the server's matching engine. The client only
//! moves it on and off the wire; it never evaluates a rule.

use bytes::BufMut;

use crate::codec::{put_length_prefixed, DecodeError, Reader};

/// Descriptor tag of a pattern (regular expression) rule.
pub const PATTERN_RULE_TAG: u8 = 4;

/// Server-defined rule encoding: a type tag followed by a per-type body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleDescriptor {
    /// Pattern matched against request fields
    Pattern { pattern: Vec<u8>, multi_line: bool },
}

impl RuleDescriptor {
    pub fn pattern(pattern: impl Into<Vec<u8>>, multi_line: bool) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            multi_line,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::Pattern { .. } => PATTERN_RULE_TAG,
        }
    }

    /// Per-type flag byte.
    pub fn flags(&self) -> u8 {
        match self {
            Self::Pattern { multi_line, .. } => u8::from(*multi_line),
        }
    }

    /// Tag and body without the trailing flag byte. A create request places
    /// the rule id between the two.
    fn put_head(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.tag());
        match self {
            Self::Pattern { pattern, .. } => put_length_prefixed(dst, pattern),
        }
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        self.put_head(dst);
        dst.put_u8(self.flags());
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        match reader.u8()? {
            PATTERN_RULE_TAG => {
                let pattern = reader.length_prefixed()?.to_vec();
                let multi_line = reader.u8()? != 0;
                Ok(Self::Pattern {
                    pattern,
                    multi_line,
                })
            }
            tag => Err(DecodeError::UnknownRuleTag(tag)),
        }
    }

    /// Pattern text for display; invalid UTF-8 is replaced.
    pub fn pattern_lossy(&self) -> String {
        match self {
            Self::Pattern { pattern, .. } => String::from_utf8_lossy(pattern).into_owned(),
        }
    }
}

/// Payload of a create-rule request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    /// Client-chosen identifier
    pub id: u64,
    pub descriptor: RuleDescriptor,
    pub label: String,
}

impl NewRule {
    pub fn encode(&self, dst: &mut impl BufMut) {
        self.descriptor.put_head(dst);
        dst.put_u64(self.id);
        dst.put_u8(self.descriptor.flags());
        put_length_prefixed(dst, self.label.as_bytes());
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let tag = reader.u8()?;
        if tag != PATTERN_RULE_TAG {
            return Err(DecodeError::UnknownRuleTag(tag));
        }
        let pattern = reader.length_prefixed()?.to_vec();
        let id = reader.u64()?;
        let multi_line = reader.u8()? != 0;

        Ok(Self {
            id,
            descriptor: RuleDescriptor::Pattern {
                pattern,
                multi_line,
            },
            label: decode_label(reader)?,
        })
    }
}

/// One entry of the get-rules response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleListing {
    pub id: u64,
    pub descriptor: RuleDescriptor,
    /// Whether the rule is in the server's active set
    pub active: bool,
    pub label: String,
}

impl RuleListing {
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u64(self.id);
        self.descriptor.encode(dst);
        dst.put_u8(u8::from(self.active));
        put_length_prefixed(dst, self.label.as_bytes());
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: reader.u64()?,
            descriptor: RuleDescriptor::decode(reader)?,
            active: reader.u8()? != 0,
            label: decode_label(reader)?,
        })
    }
}

fn decode_label(reader: &mut Reader<'_>) -> Result<String, DecodeError> {
    Ok(String::from_utf8_lossy(reader.length_prefixed()?).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_layout() {
        let mut buf = Vec::new();
        RuleDescriptor::pattern("ab", true).encode(&mut buf);
        assert_eq!(buf, vec![4, 0, 0, 0, 0, 0, 0, 0, 2, b'a', b'b', 1]);
    }

    #[test]
    fn test_new_rule_places_id_before_flag() {
        let rule = NewRule {
            id: 0x0102,
            descriptor: RuleDescriptor::pattern("x", false),
            label: "L".to_string(),
        };
        let mut buf = Vec::new();
        rule.encode(&mut buf);

        // tag, len(8), "x", id(8), flag, len(8), "L"
        assert_eq!(buf.len(), 1 + 8 + 1 + 8 + 1 + 8 + 1);
        assert_eq!(buf[0], PATTERN_RULE_TAG);
        assert_eq!(&buf[10..18], &0x0102u64.to_be_bytes());
        assert_eq!(buf[18], 0);
        assert_eq!(buf[27], b'L');

        let decoded = NewRule::decode(&mut Reader::new(&buf)).unwrap();
        assert_eq!(decoded, rule);
    }

    #[test]
    fn test_listing_round_trip_preserves_bytes() {
        let listing = RuleListing {
            id: u64::MAX,
            descriptor: RuleDescriptor::pattern("^/admin/.*\\.php$", true),
            active: true,
            label: "block php probes ✓".to_string(),
        };
        let mut buf = Vec::new();
        listing.encode(&mut buf);

        let decoded = RuleListing::decode(&mut Reader::new(&buf)).unwrap();
        assert_eq!(decoded, listing);
        match decoded.descriptor {
            RuleDescriptor::Pattern { pattern, .. } => {
                assert_eq!(pattern, b"^/admin/.*\\.php$".to_vec())
            }
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let buf = [9u8, 0, 0];
        assert_eq!(
            RuleDescriptor::decode(&mut Reader::new(&buf)).unwrap_err(),
            DecodeError::UnknownRuleTag(9)
        );
    }

    #[test]
    fn test_truncated_pattern_rejected() {
        let mut buf = vec![PATTERN_RULE_TAG];
        buf.put_u64(50);
        buf.extend_from_slice(b"short");
        assert!(matches!(
            RuleDescriptor::decode(&mut Reader::new(&buf)),
            Err(DecodeError::LengthOverflow { declared: 50, .. })
        ));
    }
}
