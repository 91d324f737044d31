//! DATE and TIME field decoders.
//!
//! DATE (385) is sent as `dd/mm/yy`, blank-padded to the column precision.
//! Two-digit years pivot at 69: 00-68 map to 20xx, 69-99 to 19xx.
//!
//! TIME (389) has no confirmed wire format. The decoder accepts the usual
//! ISO and IBM i separators and fails on anything else.

use crate::error::{Error, Result};
use crate::protocol::buffer::latin1_decode;
use chrono::{NaiveDate, NaiveTime};

/// First two-digit year read as 19xx.
const CENTURY_PIVOT: u32 = 69;
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H.%M.%S", "%H:%M"];

/// Decode a `dd/mm/yy` DATE field.
pub fn decode_date(field: &[u8]) -> Result<NaiveDate> {
    let text = latin1_decode(field);
    let invalid = || Error::type_conversion(format!("'{}' is not a dd/mm/yy date", text));

    let mut parts = text.trim().split('/');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let day = date_part(day, 1..=2).ok_or_else(invalid)?;
    let month = date_part(month, 1..=2).ok_or_else(invalid)?;
    let year = date_part(year, 2..=2).ok_or_else(invalid)?;
    let year = if year < CENTURY_PIVOT { 2000 + year } else { 1900 + year };

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)
}

fn date_part(digits: &str, len: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Decode a TIME field.
pub fn decode_time(field: &[u8]) -> Result<NaiveTime> {
    let text = latin1_decode(field);
    let trimmed = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::type_conversion(format!("'{}' is not a time of day", text)))
}
