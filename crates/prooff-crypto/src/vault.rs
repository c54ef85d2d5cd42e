//! # Vault Key
//!
//! A 32-byte key provisioned out of band (`PROOFF_VAULT_KEY`, 64 hex chars).
//! Sealed blobs are `nonce (12 bytes) || ciphertext || tag (16 bytes)`, with
//! a fresh random nonce per seal and caller-supplied associated data.
//!
//! There is no default key. Callers without a key get [`VaultError::Locked`].

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::VaultError;

/// Nonce length for ChaCha20-Poly1305.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// Symmetric key that seals wallet secrets.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; 32]);

impl VaultKey {
    /// Wrap raw key bytes. The all-zero key is refused.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, VaultError> {
        if bytes.iter().all(|b| *b == 0) {
            return Err(VaultError::InvalidKey("all-zero key".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Parse a 64-character hex key.
    pub fn from_hex(s: &str) -> Result<Self, VaultError> {
        let s = s.trim();
        if s.len() != 64 {
            return Err(VaultError::InvalidKey(format!(
                "expected 64 hex chars, got {}",
                s.len()
            )));
        }
        let decoded = Zeroizing::new(
            hex::decode(s).map_err(|e| VaultError::InvalidKey(e.to_string()))?,
        );
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        let key = Self::from_bytes(bytes);
        bytes.zeroize();
        key
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Encrypt `plaintext`, binding it to `aad`.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, VaultError> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| VaultError::Malformed("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a blob produced by [`VaultKey::seal`] with the same `aad`.
    pub fn open(&self, sealed: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Malformed(format!(
                "sealed blob is {} bytes, need at least {}",
                sealed.len(),
                NONCE_LEN + TAG_LEN
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| VaultError::Unseal)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn seal_then_open() {
        let key = VaultKey::from_hex(KEY_HEX).unwrap();
        let sealed = key.seal(b"seed material", b"wallet-1").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 13 + TAG_LEN);
        let opened = key.open(&sealed, b"wallet-1").unwrap();
        assert_eq!(opened.as_slice(), b"seed material");
    }

    #[test]
    fn nonces_differ_between_seals() {
        let key = VaultKey::generate();
        let a = key.seal(b"x", b"").unwrap();
        let b = key.seal(b"x", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_cannot_open() {
        let sealed = VaultKey::generate().seal(b"secret", b"w").unwrap();
        let other = VaultKey::generate();
        assert_eq!(other.open(&sealed, b"w").unwrap_err(), VaultError::Unseal);
    }

    #[test]
    fn wrong_aad_cannot_open() {
        let key = VaultKey::generate();
        let sealed = key.seal(b"secret", b"wallet-a").unwrap();
        assert_eq!(key.open(&sealed, b"wallet-b").unwrap_err(), VaultError::Unseal);
    }

    #[test]
    fn tampered_blob_cannot_open() {
        let key = VaultKey::generate();
        let mut sealed = key.seal(b"secret", b"w").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert_eq!(key.open(&sealed, b"w").unwrap_err(), VaultError::Unseal);
    }

    #[test]
    fn truncated_blob_is_malformed() {
        let key = VaultKey::generate();
        assert!(matches!(
            key.open(&[0u8; 10], b"w"),
            Err(VaultError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(matches!(
            VaultKey::from_hex(&"00".repeat(32)),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(matches!(
            VaultKey::from_hex("abcd"),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(matches!(
            VaultKey::from_hex(&"zz".repeat(32)),
            Err(VaultError::InvalidKey(_))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let key = VaultKey::from_hex(KEY_HEX).unwrap();
        assert_eq!(format!("{key:?}"), "VaultKey([REDACTED])");
    }
}
