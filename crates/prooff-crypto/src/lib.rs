//! # prooff-crypto
//!
//! Cryptography used around anchoring:
//!
//! - [`content`]: SHA-256 of the raw bytes of an uploaded work. This is the
//!   `contentHash` a client submits; it is not a canonical-JSON digest.
//! - [`ed25519`]: creator signing keys. Signing input is `&CanonicalBytes`.
//! - [`vault`]: a provisioned 32-byte vault key that seals secrets with
//!   ChaCha20-Poly1305.
//! - [`wallet`]: creator wallets whose Ed25519 seed is sealed under the vault
//!   key, bound to the wallet id.
//!
//! Private key material is never serialized and never appears in `Debug`
//! output.

pub mod content;
pub mod ed25519;
pub mod error;
pub mod vault;
pub mod wallet;

pub use content::{content_hash, content_hash_reader};
pub use ed25519::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::{CryptoError, VaultError};
pub use vault::VaultKey;
pub use wallet::{CreatorWallet, WalletView};
