//! Buffer utilities for the single-byte Peasys wire encoding.
//!
//! Every character on the wire is one ISO-8859-1 byte, so character offsets
//! and byte offsets coincide inside a reply.

use crate::error::{Error, Result};
use bytes::Bytes;

/// Decode ISO-8859-1 bytes into a `String`. Never fails.
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as ISO-8859-1 bytes, appending to `buf`.
pub fn latin1_encode_into(text: &str, buf: &mut Vec<u8>) -> Result<()> {
    for c in text.chars() {
        let code = c as u32;
        if code > 0xFF {
            return Err(Error::UnencodableCharacter { character: c });
        }
        buf.push(code as u8);
    }
    Ok(())
}

/// Encode text as ISO-8859-1 bytes.
pub fn latin1_encode(text: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(text.len());
    latin1_encode_into(text, &mut buf)?;
    Ok(buf)
}

/// Length in bytes of `bytes` once decoded as ISO-8859-1 and re-encoded as UTF-8.
pub fn latin1_utf8_len(bytes: &[u8]) -> usize {
    bytes.iter().map(|&b| if b < 0x80 { 1 } else { 2 }).sum()
}

/// A read cursor over a fixed-width data payload.
///
/// Fields carry no delimiters; the caller decides each field's width and the
/// cursor only guarantees it never reads past the end.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Check if the cursor sits exactly at the end of the payload.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Read the next `width` bytes as one field.
    pub fn read_field(&mut self, width: usize) -> Result<&[u8]> {
        if !self.has_remaining(width) {
            return Err(Error::decode(
                format!(
                    "field of width {} at offset {} overruns payload ({} bytes left)",
                    width,
                    self.pos,
                    self.remaining()
                ),
                latin1_decode(&self.data),
            ));
        }
        let start = self.pos;
        self.pos += width;
        Ok(&self.data[start..self.pos])
    }

    /// The whole payload, for error reporting.
    pub fn payload_text(&self) -> String {
        latin1_decode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_utf8_len() {
        assert_eq!(latin1_utf8_len(b"abc"), 3);
        assert_eq!(latin1_utf8_len(&[b'a', 0xE9, 0xFF]), 5);
        assert_eq!(latin1_utf8_len(&[0xE9]), latin1_decode(&[0xE9]).len());
    }

    #[test]
    fn test_latin1_roundtrip_accented() {
        let bytes = latin1_encode("Évry café").unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[0], 0xC9);
        assert_eq!(latin1_decode(&bytes), "Évry café");
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        match latin1_encode("price €") {
            Err(Error::UnencodableCharacter { character }) => assert_eq!(character, '€'),
            other => panic!("Expected UnencodableCharacter, got {:?}", other),
        }
    }

    #[test]
    fn test_read_field_advances() {
        let mut buf = ReadBuffer::new(Bytes::from_static(b"0000000042abc"));
        assert_eq!(buf.read_field(10).unwrap(), b"0000000042");
        assert_eq!(buf.position(), 10);
        assert_eq!(buf.read_field(3).unwrap(), b"abc");
        assert!(buf.is_exhausted());
    }

    #[test]
    fn test_read_field_overrun() {
        let mut buf = ReadBuffer::new(Bytes::from_static(b"abc"));
        let err = buf.read_field(5).unwrap_err();
        assert_eq!(err.payload(), Some("abc"));
        assert_eq!(buf.position(), 0);
    }
}
