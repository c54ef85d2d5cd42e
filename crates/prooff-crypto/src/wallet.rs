//! # Creator Wallets
//!
//! A wallet holds a creator's Ed25519 public key and the key's seed sealed
//! under the [`VaultKey`]. The wallet id is the associated data of the seal,
//! so a sealed secret copied onto another wallet row will not open.

use prooff_core::{Timestamp, WalletId};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey};
use crate::error::{CryptoError, VaultError};
use crate::vault::VaultKey;

/// A creator wallet as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorWallet {
    pub id: WalletId,
    pub public_key: Ed25519PublicKey,
    #[serde(with = "hex_bytes")]
    pub sealed_secret: Vec<u8>,
    pub created_at: Timestamp,
}

/// The public projection of a wallet returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletView {
    pub id: WalletId,
    pub public_key: Ed25519PublicKey,
    pub created_at: Timestamp,
}

impl CreatorWallet {
    /// Generate a new key pair and seal its seed under `vault`.
    pub fn generate(vault: &VaultKey, created_at: Timestamp) -> Result<Self, VaultError> {
        let id = WalletId::new();
        let keypair = Ed25519KeyPair::generate();
        let sealed_secret = vault.seal(keypair.seed().as_slice(), id.to_string().as_bytes())?;
        Ok(Self {
            id,
            public_key: keypair.public_key(),
            sealed_secret,
            created_at,
        })
    }

    /// Unseal the signing key.
    ///
    /// Fails with [`VaultError::Unseal`] under the wrong vault key or when the
    /// sealed secret belongs to a different wallet, and with
    /// [`VaultError::Key`] if the recovered key does not match `public_key`.
    pub fn unlock(&self, vault: &VaultKey) -> Result<Ed25519KeyPair, VaultError> {
        let seed = vault.open(&self.sealed_secret, self.id.to_string().as_bytes())?;
        if seed.len() != 32 {
            return Err(VaultError::Malformed(format!("seed is {} bytes", seed.len())));
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&seed);
        let keypair = Ed25519KeyPair::from_seed(&bytes);
        if keypair.public_key() != self.public_key {
            return Err(VaultError::Key(CryptoError::KeyError(
                "unsealed key does not match wallet public key".to_string(),
            )));
        }
        Ok(keypair)
    }

    pub fn view(&self) -> WalletView {
        WalletView {
            id: self.id,
            public_key: self.public_key.clone(),
            created_at: self.created_at,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prooff_core::CanonicalBytes;

    use crate::ed25519::verify_with_public_key;

    #[test]
    fn generated_wallet_unlocks_and_signs() {
        let vault = VaultKey::generate();
        let wallet = CreatorWallet::generate(&vault, Timestamp::now()).unwrap();
        let kp = wallet.unlock(&vault).unwrap();
        let data = CanonicalBytes::new(&serde_json::json!({"title": "Dawn"})).unwrap();
        let sig = kp.sign(&data);
        verify_with_public_key(&data, &sig, &wallet.public_key).unwrap();
    }

    #[test]
    fn other_vault_key_cannot_unlock() {
        let wallet = CreatorWallet::generate(&VaultKey::generate(), Timestamp::now()).unwrap();
        assert!(matches!(
            wallet.unlock(&VaultKey::generate()),
            Err(VaultError::Unseal)
        ));
    }

    #[test]
    fn sealed_secret_is_bound_to_wallet_id() {
        let vault = VaultKey::generate();
        let a = CreatorWallet::generate(&vault, Timestamp::now()).unwrap();
        let mut b = CreatorWallet::generate(&vault, Timestamp::now()).unwrap();
        b.sealed_secret = a.sealed_secret.clone();
        assert!(matches!(b.unlock(&vault), Err(VaultError::Unseal)));
    }

    #[test]
    fn mismatched_public_key_is_detected() {
        let vault = VaultKey::generate();
        let mut wallet = CreatorWallet::generate(&vault, Timestamp::now()).unwrap();
        wallet.public_key = Ed25519KeyPair::generate().public_key();
        assert!(matches!(wallet.unlock(&vault), Err(VaultError::Key(_))));
    }

    #[test]
    fn wallet_serde_keeps_sealed_secret() {
        let vault = VaultKey::generate();
        let wallet = CreatorWallet::generate(&vault, Timestamp::now()).unwrap();
        let json = serde_json::to_string(&wallet).unwrap();
        let back: CreatorWallet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sealed_secret, wallet.sealed_secret);
        assert!(back.unlock(&vault).is_ok());
    }

    #[test]
    fn view_omits_secret() {
        let wallet = CreatorWallet::generate(&VaultKey::generate(), Timestamp::now()).unwrap();
        let json = serde_json::to_value(wallet.view()).unwrap();
        assert!(json.get("sealed_secret").is_none());
        assert_eq!(json["public_key"], wallet.public_key.to_hex());
    }
}
