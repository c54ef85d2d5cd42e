//! Error types for key handling and the wallet vault.

use thiserror::Error;

/// Errors from signing keys and signatures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key could not be parsed or is not a valid curve point.
    #[error("key error: {0}")]
    KeyError(String),

    /// Signature parsing or verification failed.
    #[error("verification failed: {0}")]
    VerificationFailed(String),
}

/// Errors from sealing and unsealing wallet secrets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// No vault key is provisioned.
    #[error("wallet vault is locked: no vault key configured")]
    Locked,

    /// The supplied vault key is unusable.
    #[error("invalid vault key: {0}")]
    InvalidKey(String),

    /// Authenticated decryption failed (wrong key, wrong wallet, or tampering).
    #[error("sealed secret could not be opened")]
    Unseal,

    /// The sealed blob is structurally invalid.
    #[error("malformed sealed secret: {0}")]
    Malformed(String),

    /// Key material recovered from the vault does not match the wallet.
    #[error(transparent)]
    Key(#[from] CryptoError),
}
