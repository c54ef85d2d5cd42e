//! # Canonical Serialization
//!
//! `CanonicalBytes` is the sole construction path for bytes used in digest
//! computation. An anchor's `canonicalDigest` is the only thing a verifier
//! has to go on, so the bytes must be reproducible from the stored record on
//! any machine, in any process, years later.
//!
//! ## Rules
//!
//! 1. **Reject floats.** JCS number serialization of non-integers has
//!    cross-implementation edge cases. Block numbers and timestamps are
//!    integers; anything else must be a string.
//! 2. **Sorted keys, compact separators.** Serialization uses `serde_jcs`
//!    (RFC 8785). The sorted key order is the fixed key order of every
//!    canonical anchor object.
//! 3. **UTF-8 passthrough.** Non-ASCII characters are emitted as UTF-8,
//!    not `\u` escapes.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - No float values are present.
/// - Object keys are sorted; separators are compact.
/// - The content is valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// float, `CanonicalizationError::SerializationFailed` if serde or JCS
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let checked = reject_floats(value)?;
        let s = serde_jcs::to_string(&checked)?;
        Ok(Self(s))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The canonical JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Walk the value tree and fail on the first non-integer number.
fn reject_floats(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut checked = serde_json::Map::new();
            for (k, v) in map {
                checked.insert(k, reject_floats(v)?);
            }
            Ok(Value::Object(checked))
        }
        Value::Array(arr) => {
            let checked: Result<Vec<_>, _> = arr.into_iter().map(reject_floats).collect();
            Ok(Value::Array(checked?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_keys_with_compact_separators() {
        let data = serde_json::json!({"network": "ethereum", "contentHash": "abc123", "blockNumber": 7});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(
            cb.as_str(),
            r#"{"blockNumber":7,"contentHash":"abc123","network":"ethereum"}"#
        );
    }

    #[test]
    fn nested_objects_are_sorted_too() {
        let data = serde_json::json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(cb.as_str(), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn float_is_rejected() {
        let data = serde_json::json!({"blockTimestampMs": 1.5});
        match CanonicalBytes::new(&data) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 1.5),
            other => panic!("expected FloatRejected, got: {other:?}"),
        }
    }

    #[test]
    fn deeply_nested_float_is_rejected() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.25}]}});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn millisecond_timestamps_pass() {
        let data = serde_json::json!({"blockTimestampMs": 1_700_000_000_000u64});
        let cb = CanonicalBytes::new(&data).expect("integers should be accepted");
        assert_eq!(cb.as_str(), r#"{"blockTimestampMs":1700000000000}"#);
    }

    #[test]
    fn null_and_bool_pass_through() {
        let data = serde_json::json!({"flag": true, "key": null});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"flag":true,"key":null}"#);
    }

    #[test]
    fn empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
    }

    #[test]
    fn unicode_is_not_escaped() {
        let data = serde_json::json!({"title": "\u{00e9}t\u{00e9}"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert!(cb.as_str().contains('\u{00e9}'));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z]{1,10}", inner, 0..8).prop_map(|m| {
                    Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonicalization_is_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_output_reparses_to_same_value(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let parsed: Value = serde_json::from_str(cb.as_str()).unwrap();
            prop_assert_eq!(parsed, value);
        }

        #[test]
        fn recanonicalizing_is_a_fixed_point(value in json_value_no_floats()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_str(first.as_str()).unwrap();
            let second = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
