//! # Identity Newtypes
//!
//! Newtype wrappers for identifiers. You cannot pass a `ContentHash` where a
//! `CertificateId` is expected, and string-backed identifiers re-validate on
//! deserialization so a stored record cannot smuggle in a malformed value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length of a certificate identifier.
pub const MAX_CERTIFICATE_ID_LEN: usize = 128;

/// Maximum length of a content hash string.
pub const MAX_CONTENT_HASH_LEN: usize = 256;

/// Identifier of a proof-of-authorship certificate (e.g. `CERT-1`).
///
/// Allowed characters: ASCII alphanumerics and `-`, `_`, `.`, `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId(String);

impl CertificateId {
    /// Validate and wrap a certificate identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::InvalidCertificateId(
                "must not be empty".to_string(),
            ));
        }
        if id.len() > MAX_CERTIFICATE_ID_LEN {
            return Err(ValidationError::InvalidCertificateId(format!(
                "must not exceed {MAX_CERTIFICATE_ID_LEN} characters"
            )));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        {
            return Err(ValidationError::InvalidCertificateId(format!(
                "unexpected character {c:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Generate a fresh `CERT-<32 upper hex>` identifier.
    pub fn generate() -> Self {
        Self(format!(
            "CERT-{}",
            Uuid::new_v4().simple().to_string().to_uppercase()
        ))
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CertificateId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of a creative work's content, as supplied by the uploader.
///
/// Usually the lowercase hex SHA-256 of the raw bytes, but any printable
/// token without whitespace is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Validate and wrap a content hash.
    pub fn new(hash: impl Into<String>) -> Result<Self, ValidationError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(ValidationError::InvalidContentHash(
                "must not be empty".to_string(),
            ));
        }
        if hash.len() > MAX_CONTENT_HASH_LEN {
            return Err(ValidationError::InvalidContentHash(format!(
                "must not exceed {MAX_CONTENT_HASH_LEN} characters"
            )));
        }
        if hash.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidContentHash(
                "must not contain whitespace or control characters".to_string(),
            ));
        }
        Ok(Self(hash))
    }

    /// Borrow the hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an uploaded creative work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(pub Uuid);

/// Unique identifier for a creator wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub Uuid);

impl WorkId {
    /// Generate a new random work identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletId {
    /// Generate a new random wallet identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_id_accepts_simple_ids() {
        assert!(CertificateId::new("CERT-1").is_ok());
        assert!(CertificateId::new("cert_2024.07:a").is_ok());
    }

    #[test]
    fn certificate_id_rejects_bad_ids() {
        assert!(CertificateId::new("").is_err());
        assert!(CertificateId::new("CERT 1").is_err());
        assert!(CertificateId::new("CERT/1").is_err());
        assert!(CertificateId::new("x".repeat(MAX_CERTIFICATE_ID_LEN + 1)).is_err());
    }

    #[test]
    fn generated_certificate_ids_are_valid_and_distinct() {
        let a = CertificateId::generate();
        let b = CertificateId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("CERT-"));
        assert_eq!(a.as_str().len(), 5 + 32);
        assert!(CertificateId::new(a.as_str()).is_ok());
    }

    #[test]
    fn certificate_id_deserialization_validates() {
        let ok: CertificateId = serde_json::from_str("\"CERT-1\"").unwrap();
        assert_eq!(ok.as_str(), "CERT-1");
        assert!(serde_json::from_str::<CertificateId>("\"bad id\"").is_err());
    }

    #[test]
    fn content_hash_validation() {
        assert!(ContentHash::new("abc123").is_ok());
        assert!(ContentHash::new("").is_err());
        assert!(ContentHash::new("abc 123").is_err());
        assert!(ContentHash::new("abc\n").is_err());
    }

    #[test]
    fn work_id_serializes_as_bare_uuid() {
        let id = WorkId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
