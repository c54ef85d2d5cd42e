//! # Anchor Service
//!
//! Entry point for creating, loading and verifying anchors. Build one at
//! process start and share it behind an `Arc`; every dependency (probes,
//! fallback chain, store, clock) is passed in.

use std::sync::Arc;

use prooff_core::{CertificateId, Clock, ContentHash};
use serde::{Deserialize, Serialize};

use crate::composer::{check_extra, AnchorFields, ChainBlock, ExtraFields};
use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::fallback::{Attempt, FallbackChain, Resolution};
use crate::network::Network;
use crate::probe::ProbeRegistry;
use crate::record::AnchorRecord;
use crate::store::AnchorStore;
use crate::verifier::{AnchorVerifier, VerificationReport};

/// A request to anchor a content hash for a certificate.
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorRequest {
    pub content_hash: ContentHash,
    pub certificate_id: CertificateId,
    /// Extra root fields bound into the digest.
    #[serde(default)]
    pub extra: ExtraFields,
}

/// A freshly created anchor.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorOutcome {
    pub record: AnchorRecord,
    pub explorer_urls: Vec<String>,
    /// Stages that failed before the anchor was made. Not persisted.
    pub attempts: Vec<Attempt>,
}

#[derive(Debug)]
pub struct AnchorService {
    chain: FallbackChain,
    verifier: AnchorVerifier,
    store: Arc<dyn AnchorStore>,
    clock: Arc<dyn Clock>,
}

impl AnchorService {
    pub fn new(
        chain: FallbackChain,
        verifier: AnchorVerifier,
        store: Arc<dyn AnchorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chain,
            verifier,
            store,
            clock,
        }
    }

    /// Wire JSON-RPC probes from `config`. Verification re-probes are bounded
    /// by the stage timeout.
    pub fn from_config(
        config: &AnchorConfig,
        store: Arc<dyn AnchorStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AnchorError> {
        let registry = ProbeRegistry::from_config(config)?;
        let chain = FallbackChain::from_config(config, &registry)?;
        let verifier = AnchorVerifier::new(registry, config.stage_timeout());
        Ok(Self::new(chain, verifier, store, clock))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Anchor `request.content_hash` for `request.certificate_id`.
    ///
    /// Never fails because of the network: when no chain answers, the
    /// record is anchored to the local clock.
    pub async fn create_anchor(&self, request: AnchorRequest) -> Result<AnchorOutcome, AnchorError> {
        check_extra(&request.extra).map_err(|e| AnchorError::InvalidInput(e.to_string()))?;

        if self.store.load(&request.certificate_id).await?.is_some() {
            return Err(AnchorError::AlreadyAnchored {
                certificate_id: request.certificate_id,
            });
        }

        let outcome = self.chain.resolve().await;
        let (network, block) = match outcome.resolution {
            Resolution::Chain { network, header } => (
                network,
                Some(ChainBlock {
                    number: header.number,
                    timestamp_ms: header.timestamp_ms(),
                    hash: header.hash,
                }),
            ),
            Resolution::Local => (Network::LocalVerifiable, None),
        };

        let record = AnchorRecord::seal(AnchorFields {
            content_hash: request.content_hash,
            certificate_id: request.certificate_id,
            network,
            block,
            timestamp_ms: self.clock.now_ms(),
            extra: request.extra,
        })?;
        self.store.save(record.clone()).await?;

        tracing::info!(
            certificate_id = %record.certificate_id,
            network = %record.network,
            digest = %record.canonical_digest,
            "anchor created"
        );

        Ok(AnchorOutcome {
            explorer_urls: record.explorer_urls(),
            record,
            attempts: outcome.attempts,
        })
    }

    pub async fn load(&self, certificate_id: &CertificateId) -> Result<Option<AnchorRecord>, AnchorError> {
        Ok(self.store.load(certificate_id).await?)
    }

    /// Load and verify the stored anchor for a certificate.
    pub async fn verify(&self, certificate_id: &CertificateId) -> Result<VerificationReport, AnchorError> {
        let record = self
            .load(certificate_id)
            .await?
            .ok_or_else(|| AnchorError::NotFound {
                certificate_id: certificate_id.clone(),
            })?;
        Ok(self.verify_record(&record).await)
    }

    /// Verify a record supplied by the caller.
    pub async fn verify_record(&self, record: &AnchorRecord) -> VerificationReport {
        self.verifier.verify(record).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use prooff_core::FixedClock;

    use super::*;
    use crate::fallback::testing::{stage, ScriptedProbe};
    use crate::store::InMemoryAnchorStore;

    fn request(id: &str) -> AnchorRequest {
        AnchorRequest {
            content_hash: ContentHash::new("abc123").unwrap(),
            certificate_id: CertificateId::new(id).unwrap(),
            extra: ExtraFields::new(),
        }
    }

    fn service(probes: Vec<Arc<ScriptedProbe>>) -> AnchorService {
        let mut registry = ProbeRegistry::new();
        for p in &probes {
            registry.insert(p.clone());
        }
        let chain = FallbackChain::new(probes.into_iter().map(stage).collect());
        AnchorService::new(
            chain,
            AnchorVerifier::new(registry, Duration::from_millis(200)),
            Arc::new(InMemoryAnchorStore::new()),
            Arc::new(FixedClock(1_700_000_123_456)),
        )
    }

    #[tokio::test]
    async fn local_anchor_verifies_immediately() {
        let svc = service(vec![
            ScriptedProbe::down(Network::Ethereum),
            ScriptedProbe::down(Network::Polygon),
        ]);
        let outcome = svc.create_anchor(request("CERT-1")).await.unwrap();
        assert_eq!(outcome.record.network, Network::LocalVerifiable);
        assert_eq!(outcome.record.created_at_ms, 1_700_000_123_456);
        assert!(outcome.explorer_urls.is_empty());
        assert_eq!(outcome.attempts.len(), 2);
        assert!(svc.verify(&outcome.record.certificate_id).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn chain_anchor_carries_block_and_explorer_url() {
        let svc = service(vec![ScriptedProbe::up(Network::Polygon, 77, "0xab")]);
        let outcome = svc.create_anchor(request("CERT-2")).await.unwrap();
        assert_eq!(outcome.record.block_number, Some(77));
        assert_eq!(outcome.record.block_timestamp_ms, Some(1_700_000_000_000));
        assert_eq!(outcome.explorer_urls, vec!["https://polygonscan.com/block/77"]);
        let report = svc.verify_record(&outcome.record).await;
        assert_eq!(report.chain_confirmed, Some(true));
    }

    #[tokio::test]
    async fn duplicate_certificate_is_refused() {
        let svc = service(vec![]);
        svc.create_anchor(request("CERT-3")).await.unwrap();
        let err = svc.create_anchor(request("CERT-3")).await.unwrap_err();
        assert!(matches!(err, AnchorError::AlreadyAnchored { .. }));
    }

    #[tokio::test]
    async fn reserved_extra_is_invalid_input() {
        let svc = service(vec![]);
        let mut req = request("CERT-4");
        req.extra.insert("timestamp".to_string(), serde_json::json!(1));
        assert!(matches!(
            svc.create_anchor(req).await,
            Err(AnchorError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn verify_unknown_certificate_is_not_found() {
        let svc = service(vec![]);
        let err = svc
            .verify(&CertificateId::new("CERT-404").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AnchorError::NotFound { .. }));
    }

    #[tokio::test]
    async fn extra_fields_are_bound_into_digest() {
        let svc = service(vec![]);
        let mut req = request("CERT-5");
        req.extra.insert("workId".to_string(), serde_json::json!("w-1"));
        let mut record = svc.create_anchor(req).await.unwrap().record;
        assert!(svc.verify_record(&record).await.is_valid);
        record.extra.insert("workId".to_string(), serde_json::json!("w-2"));
        assert!(!svc.verify_record(&record).await.is_valid);
    }
}
