//! Message traits for single-allocation serialization of outbound commands.
//!
//! Messages implement the `Message` trait, which reports the encoded size up
//! front so the framer can allocate the send buffer exactly once.

use crate::error::Result;
use crate::protocol::buffer::latin1_encode_into;

/// A message that can calculate its wire size and serialize to bytes.
///
/// 1. Call `wire_size()` to determine buffer capacity needed
/// 2. Allocate buffer with exact capacity
/// 3. Call `write_to()` to serialize directly into buffer
pub trait Message {
    /// Calculate the serialized size in bytes.
    fn wire_size(&self) -> usize;

    /// Write message content to buffer.
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// Extension trait for writing Peasys wire text to `Vec<u8>`.
pub trait WriteExt {
    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write text as ISO-8859-1.
    fn write_latin1(&mut self, text: &str) -> Result<()>;

    /// Write text as ISO-8859-1, left-justified and space-padded to `width`.
    ///
    /// Text longer than `width` is cut to `width` characters.
    fn write_padded(&mut self, text: &str, width: usize) -> Result<()>;
}

impl WriteExt for Vec<u8> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn write_latin1(&mut self, text: &str) -> Result<()> {
        latin1_encode_into(text, self)
    }

    fn write_padded(&mut self, text: &str, width: usize) -> Result<()> {
        let start = self.len();
        let truncated: String = text.chars().take(width).collect();
        latin1_encode_into(&truncated, self)?;
        let written = self.len() - start;
        self.resize(self.len() + (width - written), b' ');
        Ok(())
    }
}

/// Number of wire bytes `text` occupies (one per character).
#[inline]
pub fn latin1_wire_size(text: &str) -> usize {
    text.chars().count()
}
