//! Column descriptors from the metadata header reply.
//!
//! The server describes each column as a JSON object with `name`, `type`,
//! `scal` and `prec` fields. Numbers sometimes arrive as strings, so the
//! numeric fields accept either form.

use crate::error::{Error, Result};
use crate::protocol::constants::MAX_DECIMAL_SCALE;
use serde::{Deserialize, Deserializer};

/// One column of a SELECT, in server order.
///
/// Order is significant: it is the only thing tying a descriptor to its slice
/// of the data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as sent by the server.
    pub name: String,
    /// SQL type code (e.g. 484 for DECIMAL).
    pub type_code: i32,
    /// Implied decimal places.
    pub scale: u32,
    /// Declared width in characters.
    pub precision: u32,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, type_code: i32, scale: u32, precision: u32) -> Self {
        Self {
            name: name.into(),
            type_code,
            scale,
            precision,
        }
    }

    /// Lower-cased, trimmed name used as the result set key.
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Text(String),
}

fn loose_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseInt::deserialize(deserializer)? {
        LooseInt::Int(i) => Ok(i),
        LooseInt::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not an integer", s))),
    }
}

#[derive(Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type", deserialize_with = "loose_int")]
    type_code: i64,
    #[serde(rename = "scal", deserialize_with = "loose_int")]
    scale: i64,
    #[serde(rename = "prec", deserialize_with = "loose_int")]
    precision: i64,
}

impl TryFrom<RawColumn> for ColumnDescriptor {
    type Error = String;

    fn try_from(raw: RawColumn) -> std::result::Result<Self, Self::Error> {
        let type_code = i32::try_from(raw.type_code)
            .map_err(|_| format!("type code {} out of range", raw.type_code))?;
        let scale = u32::try_from(raw.scale)
            .ok()
            .filter(|&s| s <= MAX_DECIMAL_SCALE)
            .ok_or_else(|| format!("scale {} out of range", raw.scale))?;
        let precision = u32::try_from(raw.precision)
            .map_err(|_| format!("precision {} out of range", raw.precision))?;
        Ok(Self {
            name: raw.name,
            type_code,
            scale,
            precision,
        })
    }
}

/// Decode descriptors from an already-parsed JSON document.
///
/// Every element must carry all four fields; anything else is a decode error
/// wrapping `raw`.
pub fn descriptors_from_json(json: serde_json::Value, raw: &str) -> Result<Vec<ColumnDescriptor>> {
    let columns: Vec<RawColumn> = serde_json::from_value(json)
        .map_err(|e| Error::decode(format!("malformed column metadata: {}", e), raw))?;
    columns
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            ColumnDescriptor::try_from(c)
                .map_err(|e| Error::decode(format!("column {}: {}", i, e), raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<ColumnDescriptor>> {
        let json: serde_json::Value = serde_json::from_str(text).unwrap();
        descriptors_from_json(json, text)
    }

    #[test]
    fn test_descriptors_numeric_fields() {
        let cols = parse(r#"[{"name":"ID  ","type":496,"scal":0,"prec":10}]"#).unwrap();
        assert_eq!(cols, vec![ColumnDescriptor::new("ID  ", 496, 0, 10)]);
        assert_eq!(cols[0].key(), "id");
    }

    #[test]
    fn test_descriptors_string_fields() {
        let cols = parse(
            r#"[{"name":"PRICE","type":"484","scal":" 2","prec":"7"},
                {"name":"LABEL","type":"452","scal":"0","prec":"30"}]"#,
        )
        .unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], ColumnDescriptor::new("PRICE", 484, 2, 7));
        assert_eq!(cols[1].precision, 30);
    }

    #[test]
    fn test_descriptors_missing_field() {
        let err = parse(r#"[{"name":"ID","type":496,"prec":10}]"#).unwrap_err();
        assert!(matches!(err, Error::ProtocolDecode { .. }));
    }

    #[test]
    fn test_descriptors_negative_precision() {
        let err = parse(r#"[{"name":"ID","type":496,"scal":0,"prec":-1}]"#).unwrap_err();
        assert!(err.to_string().contains("precision"));
    }

    #[test]
    fn test_descriptors_scale_out_of_range() {
        let err = parse(r#"[{"name":"AMT","type":484,"scal":4294967295,"prec":3}]"#).unwrap_err();
        assert!(matches!(err, Error::ProtocolDecode { .. }));
        assert!(err.to_string().contains("scale"));
        assert!(parse(r#"[{"name":"AMT","type":484,"scal":64,"prec":63}]"#).is_err());
        assert!(parse(r#"[{"name":"AMT","type":484,"scal":63,"prec":63}]"#).is_ok());
    }

    #[test]
    fn test_descriptors_not_an_array() {
        assert!(parse(r#"{"name":"ID"}"#).is_err());
    }
}
