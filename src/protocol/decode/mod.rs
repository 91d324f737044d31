//! Field decoders for the fixed-width data payload.
//!
//! The payload has no delimiters. Each column's type code, scale and
//! precision select a [`FieldRule`], which fixes how many characters the
//! column occupies and how they are read.
//!
//! | Type code            | Condition  | Width       | Value     |
//! |----------------------|------------|-------------|-----------|
//! | 484, 485, 488, 489   | scale ≠ 0  | `precision` | `Decimal` |
//! | 492, 493             |            | 20          | `Integer` |
//! | 496, 497             |            | 10          | `Integer` |
//! | 500, 501             |            | 5           | `Integer` |
//! | 385                  |            | `precision` | `Date`    |
//! | 389                  |            | `precision` | `Time`    |
//! | anything else        |            | `precision` | `Text`    |

mod date;
mod number;
mod rows;

pub use date::{decode_date, decode_time};
pub use number::{decode_integer, decode_packed};
pub use rows::{compat_row_count, decode_rows, has_width_discrepancy, row_width};

use crate::error::Result;
use crate::protocol::buffer::latin1_decode;
use crate::protocol::constants::*;
use crate::protocol::types::{ColumnDescriptor, Value};

/// How one column is laid out in a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Digits with an implied decimal point.
    Packed { scale: u32, width: usize },
    /// Signed integer in a fixed-width field.
    Integer { width: usize },
    /// `dd/mm/yy` date.
    Date { width: usize },
    /// Time of day.
    Time { width: usize },
    /// Trimmed text.
    Text { width: usize },
}

impl FieldRule {
    /// Select the rule for a column.
    pub fn for_column(type_code: i32, scale: u32, precision: u32) -> Self {
        let width = precision as usize;
        match type_code {
            TYPE_DECIMAL | TYPE_DECIMAL_NULLABLE | TYPE_NUMERIC | TYPE_NUMERIC_NULLABLE
                if scale != 0 =>
            {
                FieldRule::Packed { scale, width }
            }
            TYPE_BIGINT | TYPE_BIGINT_NULLABLE => FieldRule::Integer {
                width: BIGINT_WIDTH,
            },
            TYPE_INTEGER | TYPE_INTEGER_NULLABLE => FieldRule::Integer {
                width: INTEGER_WIDTH,
            },
            TYPE_SMALLINT | TYPE_SMALLINT_NULLABLE => FieldRule::Integer {
                width: SMALLINT_WIDTH,
            },
            TYPE_TIME => FieldRule::Time { width },
            TYPE_DATE => FieldRule::Date { width },
            _ => FieldRule::Text { width },
        }
    }

    /// Select the rule for a descriptor.
    pub fn for_descriptor(column: &ColumnDescriptor) -> Self {
        Self::for_column(column.type_code, column.scale, column.precision)
    }

    /// Characters this field consumes from the payload.
    pub fn width(&self) -> usize {
        match *self {
            FieldRule::Packed { width, .. }
            | FieldRule::Integer { width }
            | FieldRule::Date { width }
            | FieldRule::Time { width }
            | FieldRule::Text { width } => width,
        }
    }

    /// Decode one field of exactly [`width`](Self::width) bytes.
    pub fn decode(&self, field: &[u8]) -> Result<Value> {
        Ok(match *self {
            FieldRule::Packed { scale, .. } => Value::Decimal(decode_packed(field, scale)?),
            FieldRule::Integer { .. } => Value::Integer(decode_integer(field)?),
            FieldRule::Date { .. } => Value::Date(decode_date(field)?),
            FieldRule::Time { .. } => Value::Time(decode_time(field)?),
            FieldRule::Text { .. } => Value::Text(latin1_decode(field).trim().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::PackedDecimal;

    #[test]
    fn test_packed_families() {
        for code in [484, 485, 488, 489] {
            let rule = FieldRule::for_column(code, 2, 5);
            assert_eq!(rule, FieldRule::Packed { scale: 2, width: 5 });
            let value = rule.decode(b"00123").unwrap();
            assert_eq!(value.to_f64(), Some(1.23));
        }
    }

    #[test]
    fn test_packed_zero_scale_is_text() {
        let rule = FieldRule::for_column(484, 0, 5);
        assert_eq!(rule, FieldRule::Text { width: 5 });
        assert_eq!(rule.decode(b"00123").unwrap(), Value::Text("00123".to_string()));
    }

    #[test]
    fn test_integer_widths_ignore_precision() {
        assert_eq!(FieldRule::for_column(492, 0, 19).width(), 20);
        assert_eq!(FieldRule::for_column(493, 0, 19).width(), 20);
        assert_eq!(FieldRule::for_column(496, 0, 4).width(), 10);
        assert_eq!(FieldRule::for_column(497, 3, 4).width(), 10);
        assert_eq!(FieldRule::for_column(500, 0, 2).width(), 5);
        assert_eq!(FieldRule::for_column(501, 0, 2).width(), 5);
    }

    #[test]
    fn test_integer_decode() {
        let rule = FieldRule::for_column(496, 0, 4);
        assert_eq!(rule.decode(b"0000000042").unwrap(), Value::Integer(42));
        let rule = FieldRule::for_column(500, 0, 5);
        assert_eq!(rule.decode(b"-0007").unwrap(), Value::Integer(-7));
    }

    #[test]
    fn test_text_is_trimmed() {
        let rule = FieldRule::for_column(452, 0, 8);
        assert_eq!(rule.decode(b"  ABC   ").unwrap(), Value::Text("ABC".to_string()));
    }

    #[test]
    fn test_date_and_time_rules() {
        assert_eq!(FieldRule::for_column(385, 0, 8), FieldRule::Date { width: 8 });
        assert_eq!(FieldRule::for_column(389, 0, 8), FieldRule::Time { width: 8 });
        let date = FieldRule::for_column(385, 0, 10).decode(b"07/03/24  ").unwrap();
        assert_eq!(date.to_string(), "2024-03-07");
    }

    #[test]
    fn test_decode_error_on_bad_integer() {
        let rule = FieldRule::for_column(496, 0, 10);
        assert!(rule.decode(b"00000000x2").is_err());
    }

    #[test]
    fn test_packed_huge_scale_is_decode_error() {
        let rule = FieldRule::for_column(484, u32::MAX, 3);
        assert!(rule.decode(b"1.5").is_err());
        assert!(rule.decode(b"015").is_err());
    }

    #[test]
    fn test_decimal_value_exact() {
        let rule = FieldRule::for_column(488, 3, 7);
        assert_eq!(
            rule.decode(b"0012345").unwrap(),
            Value::Decimal(PackedDecimal::new(12345, 3))
        );
    }
}
