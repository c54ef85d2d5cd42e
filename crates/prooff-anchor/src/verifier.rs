//! # Anchor Verifier
//!
//! Re-derives an anchor's digest from its fields and compares it with the
//! stored `canonicalDigest` in constant time. Chain records are then checked
//! against the chain: the verifier re-probes the same network for the named
//! block and requires the same block hash.
//!
//! Verification fails closed. An unreachable or unconfigured network makes a
//! chain record invalid, not "unknown". The chain check trusts the RPC
//! provider; there is no light-client proof.

use std::time::Duration;

use prooff_core::ContentDigest;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::composer::{compose, ChainBlock};
use crate::network::Network;
use crate::probe::{BlockTag, ProbeRegistry};
use crate::record::AnchorRecord;

/// Why a record failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
    /// The recomputed digest differs from `canonicalDigest`.
    DigestMismatch,
    /// The chain reports a different hash for the block.
    BlockHashMismatch { expected: String, actual: String },
    /// The chain could not be asked.
    ChainUnreachable { reason: String },
    /// Block fields do not fit the network, or the digest is not hex.
    MalformedRecord { reason: String },
    /// The record's fields cannot be canonicalized.
    EncodingFailed { reason: String },
}

impl VerificationFailure {
    /// Metric label for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DigestMismatch => "digest_mismatch",
            Self::BlockHashMismatch { .. } => "block_hash_mismatch",
            Self::ChainUnreachable { .. } => "chain_unreachable",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::EncodingFailed { .. } => "encoding_failed",
        }
    }
}

/// Result of verifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub is_valid: bool,
    pub digest_matches: bool,
    /// `None` for local records and for records that failed before the
    /// chain was consulted.
    pub chain_confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<VerificationFailure>,
}

impl VerificationReport {
    fn valid(chain_confirmed: Option<bool>) -> Self {
        Self {
            is_valid: true,
            digest_matches: true,
            chain_confirmed,
            failure: None,
        }
    }

    fn invalid(digest_matches: bool, chain_confirmed: Option<bool>, failure: VerificationFailure) -> Self {
        Self {
            is_valid: false,
            digest_matches,
            chain_confirmed,
            failure: Some(failure),
        }
    }

    /// `"valid"` or the failure kind.
    pub fn outcome(&self) -> &'static str {
        self.failure.as_ref().map_or("valid", VerificationFailure::kind)
    }
}

/// Verifies anchor records.
#[derive(Debug, Clone)]
pub struct AnchorVerifier {
    probes: ProbeRegistry,
    timeout: Duration,
}

impl AnchorVerifier {
    /// `timeout` bounds each chain re-probe.
    pub fn new(probes: ProbeRegistry, timeout: Duration) -> Self {
        Self { probes, timeout }
    }

    pub async fn verify(&self, record: &AnchorRecord) -> VerificationReport {
        let fields = match record.fields() {
            Ok(fields) => fields,
            Err(e) => {
                return VerificationReport::invalid(
                    false,
                    None,
                    VerificationFailure::MalformedRecord { reason: e.0 },
                )
            }
        };
        let stored = match ContentDigest::from_hex(&record.canonical_digest) {
            Ok(d) => d,
            Err(e) => {
                return VerificationReport::invalid(
                    false,
                    None,
                    VerificationFailure::MalformedRecord {
                        reason: e.to_string(),
                    },
                )
            }
        };
        let recomputed = match compose(&fields) {
            Ok(c) => c.digest,
            Err(e) => {
                return VerificationReport::invalid(
                    false,
                    None,
                    VerificationFailure::EncodingFailed {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let digest_matches: bool = recomputed.bytes[..].ct_eq(&stored.bytes[..]).into();
        if !digest_matches {
            tracing::warn!(
                certificate_id = %record.certificate_id,
                "anchor digest mismatch"
            );
            return VerificationReport::invalid(false, None, VerificationFailure::DigestMismatch);
        }

        match fields.block {
            None => VerificationReport::valid(None),
            Some(block) => self.confirm_on_chain(record.network, &block).await,
        }
    }

    async fn confirm_on_chain(&self, network: Network, block: &ChainBlock) -> VerificationReport {
        let unreachable = |reason: String| {
            tracing::warn!(network = %network, block_number = block.number, %reason, "chain confirmation failed");
            VerificationReport::invalid(
                true,
                Some(false),
                VerificationFailure::ChainUnreachable { reason },
            )
        };

        let Some(probe) = self.probes.get(network) else {
            return unreachable(format!("no probe configured for {network}"));
        };
        let header = match tokio::time::timeout(self.timeout, probe.block(BlockTag::Number(block.number))).await {
            Ok(Ok(header)) => header,
            Ok(Err(e)) => return unreachable(e.reason().to_string()),
            Err(_) => return unreachable(format!("timed out after {}ms", self.timeout.as_millis())),
        };

        if header.number == block.number && header.hash.eq_ignore_ascii_case(&block.hash) {
            VerificationReport::valid(Some(true))
        } else {
            tracing::warn!(
                network = %network,
                block_number = block.number,
                "block hash changed since anchoring"
            );
            VerificationReport::invalid(
                true,
                Some(false),
                VerificationFailure::BlockHashMismatch {
                    expected: block.hash.clone(),
                    actual: header.hash,
                },
            )
        }
    }
}
