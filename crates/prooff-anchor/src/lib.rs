//! # prooff-anchor
//!
//! Binds a work's content hash to a blockchain block header, or to the local
//! clock when no chain answers.
//!
//! ## Flow
//!
//! 1. [`AnchorService::create_anchor`] receives `{contentHash, certificateId}`
//!    plus optional extra root fields.
//! 2. The [`FallbackChain`] walks its `(probe, timeout)` stages in order
//!    (default: Ethereum, then Polygon). Each [`NetworkProbe`] issues one
//!    `eth_getBlockByNumber("latest", false)` call.
//! 3. The composer builds the canonical object and its SHA-256 digest.
//! 4. The [`AnchorRecord`] is saved through an [`AnchorStore`].
//!
//! [`AnchorVerifier`] reverses the process: it recomputes the digest and, for
//! chain records, re-reads the block to make sure its hash has not changed.
//!
//! ## Trust
//!
//! Chain reads go through public JSON-RPC providers. A verification is only
//! as trustworthy as the provider that answers it.

pub mod certificate;
pub mod composer;
pub mod config;
pub mod error;
pub mod fallback;
pub mod network;
pub mod probe;
pub mod record;
pub mod service;
pub mod store;
pub mod verifier;

pub use certificate::{Certificate, CertificateIssuer, CertificateVerification, IssueCertificate, IssuedCertificate};
pub use composer::{compose, AnchorFields, ChainBlock, ComposedAnchor, ExtraFields};
pub use config::{AnchorConfig, ConfigError};
pub use error::{AnchorError, ProbeError, StoreError};
pub use fallback::{Attempt, FallbackChain, FallbackOutcome, Resolution, Stage};
pub use network::Network;
pub use probe::{BlockHeader, BlockTag, JsonRpcProbe, NetworkProbe, ProbeRegistry};
pub use record::AnchorRecord;
pub use service::{AnchorOutcome, AnchorRequest, AnchorService};
pub use store::{AnchorStore, InMemoryAnchorStore};
pub use verifier::{AnchorVerifier, VerificationFailure, VerificationReport};
