//! # Anchor Composer
//!
//! Builds the canonical object for an anchor and digests it. The object is
//! flat: the reserved fields below plus any caller-supplied extra root
//! fields. Keys are sorted by JCS, which fixes the key order.
//!
//! | Key | Chain anchor | Local anchor |
//! |---|---|---|
//! | `contentHash` | yes | yes |
//! | `certificateId` | yes | yes |
//! | `network` | chain name | `"local_verifiable"` |
//! | `timestamp` | `createdAtMs` | `createdAtMs` |
//! | `blockNumber`, `blockHash`, `blockTimestampMs` | yes | absent |

use prooff_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, CertificateId, ContentDigest, ContentHash,
};
use serde_json::{Map, Value};

use crate::network::Network;

/// Caller-supplied root fields bound into the digest.
pub type ExtraFields = Map<String, Value>;

/// Keys that callers cannot supply as extra root fields.
pub const RESERVED_KEYS: [&str; 10] = [
    "contentHash",
    "certificateId",
    "network",
    "timestamp",
    "blockNumber",
    "blockHash",
    "blockTimestampMs",
    "canonicalDigest",
    "createdAtMs",
    "extra",
];

/// Block fields of a chain anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBlock {
    pub number: u64,
    pub hash: String,
    pub timestamp_ms: u64,
}

/// Everything that goes into an anchor digest.
#[derive(Debug, Clone)]
pub struct AnchorFields {
    pub content_hash: ContentHash,
    pub certificate_id: CertificateId,
    pub network: Network,
    /// Present exactly when `network` is a chain.
    pub block: Option<ChainBlock>,
    /// Creation time in epoch milliseconds.
    pub timestamp_ms: i64,
    pub extra: ExtraFields,
}

/// Canonical bytes of an anchor and their digest.
#[derive(Debug, Clone)]
pub struct ComposedAnchor {
    pub canonical: CanonicalBytes,
    pub digest: ContentDigest,
}

impl ComposedAnchor {
    /// Lowercase hex digest, as stored in `canonicalDigest`.
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }
}

/// Build the canonical object for `fields` and digest it.
pub fn compose(fields: &AnchorFields) -> Result<ComposedAnchor, CanonicalizationError> {
    check_extra(&fields.extra)?;

    let mut object = fields.extra.clone();
    object.insert(
        "contentHash".to_string(),
        Value::String(fields.content_hash.as_str().to_string()),
    );
    object.insert(
        "certificateId".to_string(),
        Value::String(fields.certificate_id.as_str().to_string()),
    );
    object.insert(
        "network".to_string(),
        Value::String(fields.network.as_str().to_string()),
    );
    object.insert("timestamp".to_string(), Value::from(fields.timestamp_ms));
    if let Some(block) = &fields.block {
        object.insert("blockNumber".to_string(), Value::from(block.number));
        object.insert("blockHash".to_string(), Value::String(block.hash.clone()));
        object.insert("blockTimestampMs".to_string(), Value::from(block.timestamp_ms));
    }

    let canonical = CanonicalBytes::new(&Value::Object(object))?;
    let digest = sha256_digest(&canonical);
    Ok(ComposedAnchor { canonical, digest })
}

/// Reject extra fields that collide with reserved keys or carry floats.
pub fn check_extra(extra: &ExtraFields) -> Result<(), CanonicalizationError> {
    if let Some(key) = extra.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
        return Err(CanonicalizationError::ReservedField(key.clone()));
    }
    CanonicalBytes::new(extra)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_fields() -> AnchorFields {
        AnchorFields {
            content_hash: ContentHash::new("abc123").unwrap(),
            certificate_id: CertificateId::new("CERT-1").unwrap(),
            network: Network::LocalVerifiable,
            block: None,
            timestamp_ms: 1_700_000_000_123,
            extra: ExtraFields::new(),
        }
    }

    fn chain_fields() -> AnchorFields {
        AnchorFields {
            network: Network::Ethereum,
            block: Some(ChainBlock {
                number: 18_000_000,
                hash: "0xbeef".to_string(),
                timestamp_ms: 1_700_000_000_000,
            }),
            ..local_fields()
        }
    }

    #[test]
    fn local_layout() {
        let composed = compose(&local_fields()).unwrap();
        assert_eq!(
            composed.canonical.as_str(),
            r#"{"certificateId":"CERT-1","contentHash":"abc123","network":"local_verifiable","timestamp":1700000000123}"#
        );
        assert_eq!(composed.digest_hex().len(), 64);
    }

    #[test]
    fn chain_layout() {
        let composed = compose(&chain_fields()).unwrap();
        assert_eq!(
            composed.canonical.as_str(),
            r#"{"blockHash":"0xbeef","blockNumber":18000000,"blockTimestampMs":1700000000000,"certificateId":"CERT-1","contentHash":"abc123","network":"ethereum","timestamp":1700000000123}"#
        );
    }

    #[test]
    fn composing_twice_gives_same_digest() {
        let fields = chain_fields();
        assert_eq!(
            compose(&fields).unwrap().digest,
            compose(&fields).unwrap().digest
        );
    }

    #[test]
    fn every_field_affects_digest() {
        let base = compose(&chain_fields()).unwrap().digest;
        let mut f = chain_fields();
        f.timestamp_ms += 1;
        assert_ne!(compose(&f).unwrap().digest, base);

        let mut f = chain_fields();
        if let Some(block) = f.block.as_mut() {
            block.hash = "0xbeee".to_string();
        }
        assert_ne!(compose(&f).unwrap().digest, base);

        let mut f = chain_fields();
        f.network = Network::Polygon;
        assert_ne!(compose(&f).unwrap().digest, base);
    }

    #[test]
    fn extra_fields_merge_at_root() {
        let mut f = local_fields();
        f.extra.insert("workId".to_string(), Value::String("w-1".to_string()));
        let composed = compose(&f).unwrap();
        assert!(composed.canonical.as_str().ends_with(r#""timestamp":1700000000123,"workId":"w-1"}"#));
    }

    #[test]
    fn reserved_extra_key_is_rejected() {
        let mut f = local_fields();
        f.extra.insert("network".to_string(), Value::String("ethereum".to_string()));
        assert!(matches!(
            compose(&f),
            Err(CanonicalizationError::ReservedField(k)) if k == "network"
        ));
    }

    #[test]
    fn float_extra_is_rejected() {
        let mut f = local_fields();
        f.extra.insert("score".to_string(), serde_json::json!(0.5));
        assert!(matches!(
            compose(&f),
            Err(CanonicalizationError::FloatRejected(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn digest_is_deterministic(
            hash in "[a-f0-9]{1,64}",
            id in "[A-Z0-9-]{1,20}",
            ts in 0i64..4_000_000_000_000,
            block in proptest::option::of((0u64..u32::MAX as u64, "0x[a-f0-9]{64}", 0u64..4_000_000_000_000)),
        ) {
            let fields = AnchorFields {
                content_hash: ContentHash::new(hash).unwrap(),
                certificate_id: CertificateId::new(id).unwrap(),
                network: if block.is_some() { Network::Ethereum } else { Network::LocalVerifiable },
                block: block.map(|(number, hash, timestamp_ms)| ChainBlock { number, hash, timestamp_ms }),
                timestamp_ms: ts,
                extra: ExtraFields::new(),
            };
            let a = compose(&fields).unwrap();
            let b = compose(&fields.clone()).unwrap();
            prop_assert_eq!(a.canonical.as_str(), b.canonical.as_str());
            prop_assert_eq!(a.digest, b.digest);
        }
    }
}
