//! # Error Types
//!
//! Core error types shared across the workspace. All use `thiserror`.

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum ProoffError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A value failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// A caller-supplied field would overwrite a reserved field.
    #[error("field {0:?} is reserved and cannot be supplied as an extra root field")]
    ReservedField(String),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error produced by validated constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Certificate identifier is malformed.
    #[error("invalid certificate id: {0}")]
    InvalidCertificateId(String),

    /// Content hash is malformed.
    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),

    /// Digest hex is malformed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Timestamp is malformed or out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Generic identifier failure.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
