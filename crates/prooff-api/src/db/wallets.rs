//! Creator wallet persistence on the `creator_wallets` table.
//!
//! Only the sealed secret is stored; the vault key never reaches the database.

use chrono::{DateTime, Utc};
use prooff_core::{Timestamp, WalletId};
use prooff_crypto::{CreatorWallet, Ed25519PublicKey};
use sqlx::PgPool;
use uuid::Uuid;

use super::decode_error;

pub async fn insert(pool: &PgPool, wallet: &CreatorWallet) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO creator_wallets (id, public_key, sealed_secret, created_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(wallet.id.as_uuid())
    .bind(wallet.public_key.to_hex())
    .bind(&wallet.sealed_secret)
    .bind(wallet.created_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<CreatorWallet>, sqlx::Error> {
    let rows = sqlx::query_as::<_, WalletRow>(
        "SELECT id, public_key, sealed_secret, created_at FROM creator_wallets ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WalletRow::into_wallet).collect()
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    public_key: String,
    sealed_secret: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_wallet(self) -> Result<CreatorWallet, sqlx::Error> {
        Ok(CreatorWallet {
            id: WalletId(self.id),
            public_key: Ed25519PublicKey::from_hex(&self.public_key).map_err(decode_error)?,
            sealed_secret: self.sealed_secret,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}
