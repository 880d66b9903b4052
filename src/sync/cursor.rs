//! High-water mark cursors.

/// Largest key merged so far in one stream.
///
/// A record is new only when its key is strictly greater than the cursor.
/// Each session owns its cursors; nothing is shared between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyncCursor(u64);

impl SyncCursor {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Advance to `key` if it is newer. Returns whether it was.
    pub fn advance(&mut self, key: u64) -> bool {
        if key > self.0 {
            self.0 = key;
            true
        } else {
            false
        }
    }

    /// Move to `key` unconditionally. Used by the pagination cursor, which
    /// walks backwards.
    pub fn reset(&mut self, key: u64) {
        self.0 = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_strictly_greater() {
        let mut cursor = SyncCursor::new(150);
        assert!(!cursor.advance(150));
        assert!(!cursor.advance(100));
        assert!(cursor.advance(151));
        assert_eq!(cursor.value(), 151);
    }

    #[test]
    fn test_reset_moves_backwards() {
        let mut cursor = SyncCursor::new(500);
        cursor.reset(20);
        assert_eq!(cursor.value(), 20);
    }
}
