//! Text encoding for nested catalog fields
//!
//! Genres and per-season episode counts are lists (sometimes lists of lists)
//! in the catalog but land in flat columns. They are stored as JSON with a
//! space after every separator, e.g. `["Drama", "Crime"]` or `[[10, 8], [6]]`.

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use std::io;

/// Encode a nested value as spaced JSON
pub fn encode_nested(value: &Value) -> serde_json::Result<String> {
    let mut out = Vec::new();
    value.serialize(&mut Serializer::with_formatter(&mut out, SpacedFormatter))?;
    String::from_utf8(out).map_err(serde::ser::Error::custom)
}

/// Decode text produced by [`encode_nested`] (or any JSON) back into a value
pub fn decode_nested(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(text)
}

/// Compact JSON with `", "` between items and `": "` after keys
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: Value) -> String {
        encode_nested(&value).unwrap()
    }

    #[test]
    fn test_encode_flat_list() {
        assert_eq!(encode(json!([10, 8])), "[10, 8]");
        assert_eq!(encode(json!(["Drama"])), r#"["Drama"]"#);
        assert_eq!(encode(json!([])), "[]");
    }

    #[test]
    fn test_encode_nested_list() {
        assert_eq!(encode(json!([[10, 8], [6]])), "[[10, 8], [6]]");
    }

    #[test]
    fn test_encode_escapes_strings() {
        assert_eq!(
            encode(json!(["Sci \"Fi\"", "Acción"])),
            r#"["Sci \"Fi\"", "Acción"]"#
        );
    }

    #[test]
    fn test_encode_object() {
        assert_eq!(
            encode(json!({"episodes": [1.5, 2], "season": 1})),
            r#"{"episodes": [1.5, 2], "season": 1}"#
        );
    }

    #[test]
    fn test_encode_empty_containers_and_scalars() {
        assert_eq!(encode(json!([{}, [], null])), "[{}, [], null]");
        assert_eq!(encode(json!("Drama")), r#""Drama""#);
        assert_eq!(encode(json!(2.5)), "2.5");
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let values = [
            json!(["Drama", "Comedy"]),
            json!([10, 8]),
            json!([[10, 8], [12], []]),
            json!([1.25, -3, null, true]),
            json!({"s1": [10, 8], "s2": {"special": 1}}),
        ];

        for value in values {
            let encoded = encode_nested(&value).unwrap();
            assert_eq!(decode_nested(&encoded).unwrap(), value, "round trip of {}", encoded);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_nested("[10, 8").is_err());
    }
}
