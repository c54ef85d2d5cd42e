//! The stored anchor record.

use prooff_core::{CanonicalizationError, CertificateId, ContentHash};
use serde::{Deserialize, Serialize};

use crate::composer::{compose, AnchorFields, ChainBlock, ExtraFields};
use crate::network::Network;

/// An immutable anchor bound to a certificate.
///
/// `canonicalDigest` is the SHA-256 of the canonical object built from every
/// other field. Chain records carry all three block fields; local records
/// carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub content_hash: ContentHash,
    pub certificate_id: CertificateId,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_timestamp_ms: Option<u64>,
    pub canonical_digest: String,
    pub created_at_ms: i64,
    #[serde(default, skip_serializing_if = "ExtraFields::is_empty")]
    pub extra: ExtraFields,
}

/// A record whose block fields do not match its network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed anchor record: {0}")]
pub struct ShapeError(pub String);

impl AnchorRecord {
    /// Compose `fields` and build the record carrying their digest.
    pub fn seal(fields: AnchorFields) -> Result<Self, CanonicalizationError> {
        let composed = compose(&fields)?;
        let (block_number, block_hash, block_timestamp_ms) = match fields.block {
            Some(b) => (Some(b.number), Some(b.hash), Some(b.timestamp_ms)),
            None => (None, None, None),
        };
        Ok(Self {
            content_hash: fields.content_hash,
            certificate_id: fields.certificate_id,
            network: fields.network,
            block_number,
            block_hash,
            block_timestamp_ms,
            canonical_digest: composed.digest_hex(),
            created_at_ms: fields.timestamp_ms,
            extra: fields.extra,
        })
    }

    /// Block fields, checked against the network variant.
    pub fn chain_block(&self) -> Result<Option<ChainBlock>, ShapeError> {
        match (
            self.network.is_chain(),
            self.block_number,
            self.block_hash.as_ref(),
            self.block_timestamp_ms,
        ) {
            (true, Some(number), Some(hash), Some(timestamp_ms)) => Ok(Some(ChainBlock {
                number,
                hash: hash.clone(),
                timestamp_ms,
            })),
            (true, ..) => Err(ShapeError(format!(
                "{} record is missing block fields",
                self.network
            ))),
            (false, None, None, None) => Ok(None),
            (false, ..) => Err(ShapeError(
                "local_verifiable record must not carry block fields".to_string(),
            )),
        }
    }

    /// The digest inputs this record claims.
    pub fn fields(&self) -> Result<AnchorFields, ShapeError> {
        Ok(AnchorFields {
            content_hash: self.content_hash.clone(),
            certificate_id: self.certificate_id.clone(),
            network: self.network,
            block: self.chain_block()?,
            timestamp_ms: self.created_at_ms,
            extra: self.extra.clone(),
        })
    }

    /// Human-facing block-explorer links. Empty for local records.
    pub fn explorer_urls(&self) -> Vec<String> {
        self.block_number
            .and_then(|n| self.network.explorer_block_url(n))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_record() -> AnchorRecord {
        AnchorRecord::seal(AnchorFields {
            content_hash: ContentHash::new("abc123").unwrap(),
            certificate_id: CertificateId::new("CERT-1").unwrap(),
            network: Network::Ethereum,
            block: Some(ChainBlock {
                number: 18_000_000,
                hash: "0xbeef".to_string(),
                timestamp_ms: 1_700_000_000_000,
            }),
            timestamp_ms: 1_700_000_001_000,
            extra: ExtraFields::new(),
        })
        .unwrap()
    }

    #[test]
    fn json_is_camel_case_without_empty_extra() {
        let json = serde_json::to_value(chain_record()).unwrap();
        assert_eq!(json["contentHash"], "abc123");
        assert_eq!(json["blockNumber"], 18_000_000);
        assert_eq!(json["blockTimestampMs"], 1_700_000_000_000u64);
        assert_eq!(json["createdAtMs"], 1_700_000_001_000i64);
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn local_record_omits_block_fields() {
        let mut fields = chain_record().fields().unwrap();
        fields.network = Network::LocalVerifiable;
        fields.block = None;
        let record = AnchorRecord::seal(fields).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["network"], "local_verifiable");
        assert!(json.get("blockNumber").is_none());
        assert!(record.explorer_urls().is_empty());
    }

    #[test]
    fn json_round_trip_preserves_digest_inputs() {
        let record = chain_record();
        let back: AnchorRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn shape_is_checked() {
        let mut r = chain_record();
        r.block_hash = None;
        assert!(r.chain_block().is_err());

        let mut r = chain_record();
        r.network = Network::LocalVerifiable;
        assert!(r.chain_block().is_err());
    }

    #[test]
    fn explorer_url_for_chain_record() {
        assert_eq!(
            chain_record().explorer_urls(),
            vec!["https://etherscan.io/block/18000000".to_string()]
        );
    }
}
