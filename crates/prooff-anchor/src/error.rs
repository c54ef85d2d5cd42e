//! Error types for probing, storing and creating anchors.
//!
//! Verification mismatches are not errors: the verifier reports them as
//! `isValid = false` in a [`crate::VerificationReport`].

use prooff_core::{CanonicalizationError, CertificateId, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::network::Network;

/// Failure of a single block-header probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The RPC call failed, timed out, or returned an unusable response.
    #[error("network unavailable: {network}: {reason}")]
    NetworkUnavailable {
        /// The network that was probed.
        network: Network,
        /// What went wrong.
        reason: String,
    },
}

impl ProbeError {
    pub(crate) fn unavailable(network: Network, reason: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            network,
            reason: reason.into(),
        }
    }

    /// Human-readable failure reason without the network prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::NetworkUnavailable { reason, .. } => reason,
        }
    }
}

/// Errors from an [`crate::AnchorStore`] backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record for this certificate already exists.
    #[error("an anchor for certificate {certificate_id} already exists")]
    Duplicate {
        /// The conflicting certificate id.
        certificate_id: CertificateId,
    },

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors from anchor creation and lookup.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The request is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An identifier or hash failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The certificate already carries an anchor.
    #[error("certificate {certificate_id} is already anchored")]
    AlreadyAnchored {
        /// The certificate id.
        certificate_id: CertificateId,
    },

    /// No anchor exists for the certificate.
    #[error("no anchor found for certificate {certificate_id}")]
    NotFound {
        /// The certificate id.
        certificate_id: CertificateId,
    },

    /// Canonical encoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] CanonicalizationError),

    /// Storage failed.
    #[error(transparent)]
    Store(StoreError),

    /// Anchoring is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A direct probe failed. Anchor creation never returns this.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl From<StoreError> for AnchorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { certificate_id } => Self::AlreadyAnchored { certificate_id },
            other => Self::Store(other),
        }
    }
}
