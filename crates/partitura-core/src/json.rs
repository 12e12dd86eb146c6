//! JSON encoding for emitted documents and parsing of stored input.
//!
//! Emitted documents go through `serde_json` with `preserve_order`, so the
//! bytes (and therefore the content hash) follow the insertion order of the
//! structure being serialized. Bulk input such as snapshots and config files
//! is parsed with `sonic-rs`.

use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Serialize to the compact canonical form used for hashed documents.
///
/// Slashes and non-ASCII characters are left unescaped, matching the
/// Composer repositories clients already cache against.
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::from)
}

/// Serialize to pretty JSON (reports, not hashed output).
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string_pretty(value).map_err(Error::from)
}

/// Deserialize JSON bytes.
///
/// # Errors
/// Returns error if JSON is invalid.
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    sonic_rs::from_slice(bytes).map_err(Error::from)
}

/// Decode an opaque stored JSON column of a version row.
///
/// `None` and empty strings mean the column was never set. A stored literal
/// `null` decodes to `Some(Value::Null)`.
///
/// # Errors
/// Returns [`Error::Decode`] if the stored text is not valid JSON.
pub fn decode_stored(
    version_id: u64,
    field: &'static str,
    stored: Option<&str>,
) -> Result<Option<Value>> {
    match stored {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| Error::decode(version_id, field, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn canonical_keeps_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        let bytes = to_canonical_json(&map).unwrap();
        assert_eq!(bytes, br#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn canonical_does_not_escape_slashes() {
        let bytes = to_canonical_json(&"/p/%package%/%hash%.json").unwrap();
        assert_eq!(bytes, br#""/p/%package%/%hash%.json""#);
    }

    #[test]
    fn decoded_objects_keep_stored_order() {
        let value = decode_stored(1, "autoload", Some(r#"{"psr-4":{"B\\":"b/","A\\":"a/"}}"#))
            .unwrap()
            .unwrap();
        let reencoded = String::from_utf8(to_canonical_json(&value).unwrap()).unwrap();
        assert_eq!(reencoded, r#"{"psr-4":{"B\\":"b/","A\\":"a/"}}"#);
    }

    #[test]
    fn stored_null_is_present() {
        assert_eq!(decode_stored(1, "dist", Some("null")).unwrap(), Some(Value::Null));
        assert_eq!(decode_stored(1, "dist", None).unwrap(), None);
        assert_eq!(decode_stored(1, "dist", Some("")).unwrap(), None);
    }

    #[test]
    fn malformed_stored_value_names_the_field() {
        let err = decode_stored(42, "extra", Some("{not json")).unwrap_err();
        match err {
            Error::Decode {
                version_id, field, ..
            } => {
                assert_eq!(version_id, 42);
                assert_eq!(field, "extra");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
