//! Decoded column values.

use crate::error::{Error, Result};
use crate::protocol::constants::MAX_DECIMAL_SCALE;
use chrono::{NaiveDate, NaiveTime};
use std::fmt::{self, Write};

/// Exact fixed-point number decoded from a packed/zoned decimal column.
///
/// The value is `unscaled / 10^scale`. Equality is structural, so `1.20`
/// (120, 2) and `1.2` (12, 1) compare unequal; compare [`to_f64`] results
/// when scale may differ.
///
/// [`to_f64`]: PackedDecimal::to_f64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedDecimal {
    unscaled: i128,
    scale: u32,
}

impl PackedDecimal {
    /// Create from an unscaled integer and a scale.
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    /// Parse digit text and apply an implied scale.
    ///
    /// Surrounding blanks and a leading sign are accepted. A decimal point
    /// inside the text adds its fractional digits to the scale, which may
    /// not exceed 63 in total.
    pub fn parse(text: &str, scale: u32) -> Result<Self> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(Error::type_conversion(format!(
                "'{}' is not a decimal number",
                text
            )));
        }

        let scale = scale
            .checked_add(frac_part.len() as u32)
            .filter(|&s| s <= MAX_DECIMAL_SCALE)
            .ok_or_else(|| {
                Error::type_conversion(format!("decimal '{}' scale out of range", text))
            })?;

        let digits = format!("{}{}", int_part, frac_part);
        let magnitude: i128 = digits.parse().map_err(|_| {
            Error::type_conversion(format!("decimal '{}' out of range", text))
        })?;
        Ok(Self {
            unscaled: if negative { -magnitude } else { magnitude },
            scale,
        })
    }

    /// The integer before scaling.
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Number of implied fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Convert to a float.
    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for PackedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if self.unscaled < 0 {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            return write!(f, "{}.{}", int_part, frac_part);
        }
        f.write_str("0.")?;
        for _ in digits.len()..scale {
            f.write_char('0')?;
        }
        f.write_str(&digits)
    }
}

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Packed or zoned decimal with a nonzero scale.
    Decimal(PackedDecimal),
    /// BIGINT, INTEGER or SMALLINT.
    Integer(i64),
    /// DATE in `dd/mm/yy` form.
    Date(NaiveDate),
    /// TIME.
    Time(NaiveTime),
    /// Any other column, trimmed.
    Text(String),
}

impl Value {
    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a decimal.
    pub fn as_decimal(&self) -> Option<PackedDecimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to convert a numeric value to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Decimal(d) => Some(d.to_f64()),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get the value as a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get the value as a time of day.
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
