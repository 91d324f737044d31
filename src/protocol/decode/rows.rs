//! Row decoder: slices the flat data payload into typed columns.

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::types::{ColumnDescriptor, ResultSet};
use bytes::Bytes;
use tracing::warn;

use super::FieldRule;

/// Row count estimated from the summed declared precisions.
///
/// Integer columns are counted with their declared precision even though
/// they occupy a fixed 20/10/5 characters on the wire. Returns 0 when the
/// precisions sum to 0.
pub fn compat_row_count(columns: &[ColumnDescriptor], payload_len: usize) -> usize {
    let sum_precision: usize = columns.iter().map(|c| c.precision as usize).sum();
    if sum_precision == 0 {
        return 0;
    }
    payload_len / sum_precision
}

/// Characters one row actually occupies on the wire.
pub fn row_width(columns: &[ColumnDescriptor]) -> usize {
    columns
        .iter()
        .map(|c| FieldRule::for_descriptor(c).width())
        .sum()
}

/// True if some column's wire width differs from its declared precision.
///
/// When this holds, [`compat_row_count`] may disagree with the number of
/// rows actually decoded.
pub fn has_width_discrepancy(columns: &[ColumnDescriptor]) -> bool {
    columns
        .iter()
        .any(|c| FieldRule::for_descriptor(c).width() != c.precision as usize)
}

/// Decode a data payload into a result set.
///
/// Columns are read in descriptor order, row after row, until the payload is
/// consumed. A payload that ends inside a row is a decode error.
pub fn decode_rows(columns: &[ColumnDescriptor], payload: Bytes) -> Result<ResultSet> {
    let mut buf = ReadBuffer::new(payload);

    let mut names: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let key = column.key();
        if names.contains(&key) {
            return Err(Error::decode(
                format!("duplicate column name '{}'", key),
                buf.payload_text(),
            ));
        }
        names.push(key);
    }
    let rules: Vec<FieldRule> = columns.iter().map(FieldRule::for_descriptor).collect();

    let row_count = compat_row_count(columns, buf.len());
    let mut result = ResultSet::with_columns(names, row_count);

    if !buf.is_empty() && rules.iter().all(|r| r.width() == 0) {
        return Err(Error::decode(
            format!(
                "{} bytes of row data but columns occupy no width",
                buf.len()
            ),
            buf.payload_text(),
        ));
    }

    let mut row = 0;
    while !buf.is_exhausted() {
        for (i, rule) in rules.iter().enumerate() {
            let column = &columns[i];
            if !buf.has_remaining(rule.width()) {
                return Err(Error::decode(
                    format!(
                        "row {} column '{}' needs {} bytes at offset {}, {} left",
                        row,
                        column.key(),
                        rule.width(),
                        buf.position(),
                        buf.remaining()
                    ),
                    buf.payload_text(),
                ));
            }
            let offset = buf.position();
            let field = buf.read_field(rule.width())?;
            let value = match rule.decode(field) {
                Ok(value) => value,
                Err(e) => {
                    return Err(Error::decode(
                        format!(
                            "row {} column '{}' (type {}) at offset {}: {}",
                            row,
                            column.key(),
                            column.type_code,
                            offset,
                            e
                        ),
                        buf.payload_text(),
                    ))
                }
            };
            result.push(i, value);
        }
        row += 1;
    }

    if row != row_count {
        warn!(
            decoded = row,
            estimated = row_count,
            mixed_widths = has_width_discrepancy(columns),
            "row count estimate differs from decoded rows"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{PackedDecimal, Value};

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("ID", 496, 0, 10),
            ColumnDescriptor::new("NAME      ", 452, 0, 8),
            ColumnDescriptor::new("PRICE", 484, 2, 7),
        ]
    }

    fn encode_row(id: i64, name: &str, price_cents: i64) -> String {
        format!("{:010}{:<8}{:07}", id, name, price_cents)
    }

    fn encode_rows(n: usize) -> (String, Vec<(i64, String, i64)>) {
        let rows: Vec<(i64, String, i64)> = (0..n)
            .map(|i| (i as i64 + 1, format!("ITEM{}", i), (i as i64 + 1) * 1050))
            .collect();
        let payload = rows
            .iter()
            .map(|(id, name, price)| encode_row(*id, name, *price))
            .collect();
        (payload, rows)
    }

    #[test]
    fn test_decode_rows_reconstructs_inputs() {
        for n in [0usize, 1, 5] {
            let (payload, expected) = encode_rows(n);
            let rs = decode_rows(&columns(), Bytes::from(payload)).unwrap();

            assert_eq!(rs.len(), n);
            assert_eq!(rs.row_count(), n);
            assert_eq!(rs.column_names(), vec!["id", "name", "price"]);
            for (i, (id, name, price)) in expected.iter().enumerate() {
                assert_eq!(rs.get(i, "id"), Some(&Value::Integer(*id)));
                assert_eq!(rs.get(i, "name"), Some(&Value::Text(name.clone())));
                assert_eq!(
                    rs.get(i, "price"),
                    Some(&Value::Decimal(PackedDecimal::new(*price as i128, 2)))
                );
            }
        }
    }

    #[test]
    fn test_integer_cursor_uses_fixed_width() {
        // Declared precision 4, but the field is 10 characters on the wire.
        let cols = vec![
            ColumnDescriptor::new("QTY", 497, 0, 4),
            ColumnDescriptor::new("CODE", 452, 0, 3),
        ];
        let rs = decode_rows(&cols, Bytes::from_static(b"0000000042ABC0000000007XYZ")).unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.column("qty").unwrap(), &[Value::Integer(42), Value::Integer(7)]);
        assert_eq!(rs.get(1, "code"), Some(&Value::Text("XYZ".to_string())));
        // 26 bytes / (4 + 3) declared
        assert_eq!(rs.row_count(), 3);
        assert!(has_width_discrepancy(&cols));
        assert_eq!(row_width(&cols), 13);
    }

    #[test]
    fn test_truncated_row_is_error() {
        let (mut payload, _) = encode_rows(2);
        payload.truncate(payload.len() - 3);
        let err = decode_rows(&columns(), Bytes::from(payload.clone())).unwrap_err();
        match err {
            Error::ProtocolDecode { message, payload: raw } => {
                assert!(message.contains("price"), "{}", message);
                assert_eq!(raw, payload);
            }
            other => panic!("Expected ProtocolDecode, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_field_is_error() {
        let payload = format!("{}{:<8}{:07}", "00000000x1", "A", 100);
        let err = decode_rows(&columns(), Bytes::from(payload)).unwrap_err();
        assert!(err.to_string().contains("column 'id'"));
    }

    #[test]
    fn test_duplicate_column_names_rejected() {
        let cols = vec![
            ColumnDescriptor::new("ID", 452, 0, 2),
            ColumnDescriptor::new(" id ", 452, 0, 2),
        ];
        assert!(decode_rows(&cols, Bytes::from_static(b"aabb")).is_err());
    }

    #[test]
    fn test_zero_width_columns_with_data() {
        let cols = vec![ColumnDescriptor::new("X", 452, 0, 0)];
        assert!(decode_rows(&cols, Bytes::from_static(b"abc")).is_err());
        assert_eq!(compat_row_count(&cols, 3), 0);
        let rs = decode_rows(&cols, Bytes::new()).unwrap();
        assert!(rs.is_empty());
    }

    #[test]
    fn test_no_columns() {
        assert!(decode_rows(&[], Bytes::new()).unwrap().is_empty());
        assert!(decode_rows(&[], Bytes::from_static(b"x")).is_err());
    }
}
