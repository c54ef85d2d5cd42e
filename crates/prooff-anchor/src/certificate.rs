//! # Certificates of Authorship
//!
//! A certificate names a work, carries its anchor record, and can be signed
//! by the creator's wallet key. The anchor binds `workId` as an extra root
//! field, so a certificate cannot be re-pointed at a different work without
//! breaking the anchor digest.

use std::sync::Arc;

use prooff_core::{CanonicalBytes, CanonicalizationError, CertificateId, ContentHash, Timestamp, WorkId};
use prooff_crypto::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

use crate::composer::ExtraFields;
use crate::error::AnchorError;
use crate::fallback::Attempt;
use crate::record::AnchorRecord;
use crate::service::{AnchorRequest, AnchorService};
use crate::verifier::VerificationReport;

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: CertificateId,
    pub work_id: WorkId,
    pub title: String,
    pub content_hash: ContentHash,
    pub anchor: AnchorRecord,
    pub issued_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_public_key: Option<Ed25519PublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_signature: Option<Ed25519Signature>,
}

/// Everything a creator signature covers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningBody<'a> {
    id: &'a CertificateId,
    work_id: &'a WorkId,
    title: &'a str,
    content_hash: &'a ContentHash,
    anchor: &'a AnchorRecord,
    issued_at: &'a Timestamp,
    creator_public_key: Option<&'a Ed25519PublicKey>,
}

impl Certificate {
    /// Canonical bytes of every field except the signature.
    pub fn signing_body(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&SigningBody {
            id: &self.id,
            work_id: &self.work_id,
            title: &self.title,
            content_hash: &self.content_hash,
            anchor: &self.anchor,
            issued_at: &self.issued_at,
            creator_public_key: self.creator_public_key.as_ref(),
        })
    }

    /// True when the embedded anchor belongs to this certificate.
    pub fn anchor_matches(&self) -> bool {
        self.anchor.certificate_id == self.id
            && self.anchor.content_hash == self.content_hash
            && self.anchor.extra.get("workId").and_then(|v| v.as_str())
                == Some(self.work_id.to_string().as_str())
    }

    /// `None` when unsigned, otherwise whether the creator signature holds.
    pub fn signature_valid(&self) -> Option<bool> {
        match (&self.creator_public_key, &self.creator_signature) {
            (None, None) => None,
            (Some(pk), Some(sig)) => Some(
                self.signing_body()
                    .map(|body| verify_with_public_key(&body, sig, pk).is_ok())
                    .unwrap_or(false),
            ),
            _ => Some(false),
        }
    }
}

/// Input for issuing a certificate.
#[derive(Debug)]
pub struct IssueCertificate<'a> {
    pub work_id: WorkId,
    pub title: String,
    pub content_hash: ContentHash,
    /// Creator key; the certificate is unsigned when absent.
    pub signer: Option<&'a Ed25519KeyPair>,
}

/// A freshly issued certificate.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub explorer_urls: Vec<String>,
    pub attempts: Vec<Attempt>,
}

/// Result of checking a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateVerification {
    pub is_valid: bool,
    pub anchor: VerificationReport,
    pub anchor_matches_certificate: bool,
    pub signature_valid: Option<bool>,
}

/// Issues and verifies certificates on top of an [`AnchorService`].
#[derive(Debug, Clone)]
pub struct CertificateIssuer {
    anchors: Arc<AnchorService>,
}

impl CertificateIssuer {
    pub fn new(anchors: Arc<AnchorService>) -> Self {
        Self { anchors }
    }

    pub async fn issue(&self, input: IssueCertificate<'_>) -> Result<IssuedCertificate, AnchorError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AnchorError::InvalidInput("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AnchorError::InvalidInput(format!(
                "title must not exceed {MAX_TITLE_LEN} characters"
            )));
        }

        let id = CertificateId::generate();
        let mut extra = ExtraFields::new();
        extra.insert(
            "workId".to_string(),
            serde_json::Value::String(input.work_id.to_string()),
        );
        let outcome = self
            .anchors
            .create_anchor(AnchorRequest {
                content_hash: input.content_hash.clone(),
                certificate_id: id.clone(),
                extra,
            })
            .await?;

        let mut certificate = Certificate {
            id,
            work_id: input.work_id,
            title,
            content_hash: input.content_hash,
            issued_at: Timestamp::from_epoch_millis(outcome.record.created_at_ms)?,
            anchor: outcome.record,
            creator_public_key: input.signer.map(Ed25519KeyPair::public_key),
            creator_signature: None,
        };
        if let Some(signer) = input.signer {
            certificate.creator_signature = Some(signer.sign(&certificate.signing_body()?));
        }

        tracing::info!(
            certificate_id = %certificate.id,
            work_id = %certificate.work_id,
            signed = certificate.creator_signature.is_some(),
            "certificate issued"
        );

        Ok(IssuedCertificate {
            certificate,
            explorer_urls: outcome.explorer_urls,
            attempts: outcome.attempts,
        })
    }

    /// Check the anchor, its binding to the certificate, and the signature.
    pub async fn verify(&self, certificate: &Certificate) -> CertificateVerification {
        let anchor = self.anchors.verify_record(&certificate.anchor).await;
        let anchor_matches_certificate = certificate.anchor_matches();
        let signature_valid = certificate.signature_valid();
        CertificateVerification {
            is_valid: anchor.is_valid && anchor_matches_certificate && signature_valid != Some(false),
            anchor,
            anchor_matches_certificate,
            signature_valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use prooff_core::FixedClock;

    use super::*;
    use crate::fallback::FallbackChain;
    use crate::probe::ProbeRegistry;
    use crate::store::InMemoryAnchorStore;
    use crate::verifier::AnchorVerifier;

    fn issuer() -> CertificateIssuer {
        let svc = AnchorService::new(
            FallbackChain::default(),
            AnchorVerifier::new(ProbeRegistry::new(), Duration::from_secs(1)),
            Arc::new(InMemoryAnchorStore::new()),
            Arc::new(FixedClock(1_700_000_000_000)),
        );
        CertificateIssuer::new(Arc::new(svc))
    }

    fn input(signer: Option<&Ed25519KeyPair>) -> IssueCertificate<'_> {
        IssueCertificate {
            work_id: WorkId::new(),
            title: "  Dawn over the harbour ".to_string(),
            content_hash: ContentHash::new("abc123").unwrap(),
            signer,
        }
    }

    #[tokio::test]
    async fn unsigned_certificate_verifies() {
        let issuer = issuer();
        let issued = issuer.issue(input(None)).await.unwrap();
        let cert = &issued.certificate;
        assert!(cert.id.as_str().starts_with("CERT-"));
        assert_eq!(cert.title, "Dawn over the harbour");
        assert_eq!(cert.issued_at.to_iso8601(), "2023-11-14T22:13:20Z");

        let v = issuer.verify(cert).await;
        assert!(v.is_valid);
        assert_eq!(v.signature_valid, None);
    }

    #[tokio::test]
    async fn signed_certificate_verifies_and_detects_tampering() {
        let issuer = issuer();
        let key = Ed25519KeyPair::generate();
        let mut cert = issuer.issue(input(Some(&key))).await.unwrap().certificate;
        assert_eq!(issuer.verify(&cert).await.signature_valid, Some(true));

        cert.title = "Dusk".to_string();
        let v = issuer.verify(&cert).await;
        assert_eq!(v.signature_valid, Some(false));
        assert!(!v.is_valid);
    }

    #[tokio::test]
    async fn repointed_work_breaks_binding() {
        let issuer = issuer();
        let mut cert = issuer.issue(input(None)).await.unwrap().certificate;
        cert.work_id = WorkId::new();
        let v = issuer.verify(&cert).await;
        assert!(!v.anchor_matches_certificate);
        assert!(!v.is_valid);
    }

    #[tokio::test]
    async fn key_without_signature_is_invalid() {
        let issuer = issuer();
        let mut cert = issuer.issue(input(None)).await.unwrap().certificate;
        cert.creator_public_key = Some(Ed25519KeyPair::generate().public_key());
        assert_eq!(cert.signature_valid(), Some(false));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let issuer = issuer();
        let mut req = input(None);
        req.title = "   ".to_string();
        assert!(matches!(
            issuer.issue(req).await,
            Err(AnchorError::InvalidInput(_))
        ));
    }
}
