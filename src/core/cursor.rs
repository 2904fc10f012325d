//! Bounds-checked access to the document buffer
//!
//! Every scanning routine reads through [`Text`] so that truncated or
//! malformed input turns into `DataIncomplete` instead of an out-of-range read.
//! Searches use memchr with SIMD acceleration where available:
//! - `find`, `find3` for single and triple delimiter bytes
//! - `find_seq` for multi-byte terminators via `memchr::memmem`

use crate::error::{ErrorCode, Result};
use memchr::{memchr, memchr3, memmem};

/// Owned, immutable document bytes.
#[derive(Debug, Clone)]
pub struct Text {
    bytes: Vec<u8>,
}

impl Text {
    /// Take ownership of a loaded document.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Text { bytes }
    }

    /// Number of bytes in the document
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the document is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The byte at `pos`, or `DataIncomplete` at or past the end.
    #[inline]
    pub fn at(&self, pos: usize) -> Result<u8> {
        self.bytes.get(pos).copied().ok_or(ErrorCode::DataIncomplete)
    }

    /// The byte at `pos`, if any.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    /// Bytes in `start..end`, clamped to the document.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.bytes.len());
        &self.bytes[start.min(end)..end]
    }

    /// Check if `needle` appears at `pos`
    #[inline]
    pub fn starts_with(&self, pos: usize, needle: &[u8]) -> bool {
        self.bytes
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(needle))
    }

    /// Find next `byte` at or after `from` using SIMD
    #[inline]
    pub fn find(&self, byte: u8, from: usize) -> Option<usize> {
        let rest = self.bytes.get(from..)?;
        memchr(byte, rest).map(|i| from + i)
    }

    /// Find next occurrence of any of three bytes
    #[inline]
    pub fn find3(&self, b1: u8, b2: u8, b3: u8, from: usize) -> Option<usize> {
        let rest = self.bytes.get(from..)?;
        memchr3(b1, b2, b3, rest).map(|i| from + i)
    }

    /// Find next occurrence of a byte sequence
    #[inline]
    pub fn find_seq(&self, needle: &[u8], from: usize) -> Option<usize> {
        let rest = self.bytes.get(from..)?;
        memmem::find(rest, needle).map(|i| from + i)
    }

    /// Byte length of the UTF-8 sequence led by the byte at `pos`, clamped to the document.
    pub fn char_len(&self, pos: usize) -> Result<usize> {
        let len = match self.at(pos)? {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        Ok(len.min(self.bytes.len() - pos))
    }
}

/// XML whitespace: space, tab, CR, LF
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_past_end() {
        let text = Text::new(b"<a/>".to_vec());
        assert_eq!(text.at(3), Ok(b'>'));
        assert_eq!(text.at(4), Err(ErrorCode::DataIncomplete));
        assert_eq!(text.at(usize::MAX), Err(ErrorCode::DataIncomplete));
    }

    #[test]
    fn test_find_seq() {
        let text = Text::new(b"<!-- a -- b -->x".to_vec());
        assert_eq!(text.find_seq(b"-->", 4), Some(12));
        assert_eq!(text.find_seq(b"-->", 20), None);
    }

    #[test]
    fn test_char_len_clamped() {
        let text = Text::new(vec![b'a', 0xE2, 0x82]);
        assert_eq!(text.char_len(0), Ok(1));
        assert_eq!(text.char_len(1), Ok(2));
    }

    #[test]
    fn test_slice_clamped() {
        let text = Text::new(b"abc".to_vec());
        assert_eq!(text.slice(1, 10), b"bc");
        assert_eq!(text.slice(5, 10), b"");
    }
}
