//! Numeric field decoders.
//!
//! Numbers travel as digit characters. Packed and zoned decimals carry an
//! implied decimal point given by the column scale; binary integers are
//! sent right-aligned in fixed 20/10/5 character fields.

use crate::error::{Error, Result};
use crate::protocol::buffer::latin1_decode;
use crate::protocol::types::PackedDecimal;

/// Decode a digit field with an implied scale.
pub fn decode_packed(field: &[u8], scale: u32) -> Result<PackedDecimal> {
    PackedDecimal::parse(&latin1_decode(field), scale)
}

/// Decode a fixed-width integer field.
pub fn decode_integer(field: &[u8]) -> Result<i64> {
    let text = latin1_decode(field);
    text.trim()
        .parse::<i64>()
        .map_err(|e| Error::type_conversion(format!("'{}' is not an integer: {}", text, e)))
}
