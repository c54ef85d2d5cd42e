//! Anchor record persistence on the `anchor_records` table.

use prooff_anchor::{AnchorRecord, Network};
use prooff_core::{CertificateId, ContentHash};
use sqlx::PgPool;

use super::decode_error;

/// Insert a record unless one exists for its certificate.
///
/// Returns `false` when the certificate already has a record; the stored row
/// is left untouched.
pub async fn insert(pool: &PgPool, record: &AnchorRecord) -> Result<bool, sqlx::Error> {
    let block_number = record
        .block_number
        .map(i64::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::Protocol(format!("block number out of range: {e}")))?;
    let block_timestamp_ms = record
        .block_timestamp_ms
        .map(i64::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::Protocol(format!("block timestamp out of range: {e}")))?;

    let result = sqlx::query(
        "INSERT INTO anchor_records (certificate_id, content_hash, network, block_number, block_hash,
                                     block_timestamp_ms, canonical_digest, created_at_ms, extra)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (certificate_id) DO NOTHING",
    )
    .bind(record.certificate_id.as_str())
    .bind(record.content_hash.as_str())
    .bind(record.network.as_str())
    .bind(block_number)
    .bind(record.block_hash.as_deref())
    .bind(block_timestamp_ms)
    .bind(&record.canonical_digest)
    .bind(record.created_at_ms)
    .bind(serde_json::Value::Object(record.extra.clone()))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch the record for a certificate.
pub async fn get_by_certificate_id(
    pool: &PgPool,
    certificate_id: &CertificateId,
) -> Result<Option<AnchorRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, AnchorRow>(
        "SELECT certificate_id, content_hash, network, block_number, block_hash,
                block_timestamp_ms, canonical_digest, created_at_ms, extra
         FROM anchor_records WHERE certificate_id = $1",
    )
    .bind(certificate_id.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(AnchorRow::into_record).transpose()
}

/// Load every record into memory on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AnchorRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AnchorRow>(
        "SELECT certificate_id, content_hash, network, block_number, block_hash,
                block_timestamp_ms, canonical_digest, created_at_ms, extra
         FROM anchor_records ORDER BY created_at_ms",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AnchorRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct AnchorRow {
    certificate_id: String,
    content_hash: String,
    network: String,
    block_number: Option<i64>,
    block_hash: Option<String>,
    block_timestamp_ms: Option<i64>,
    canonical_digest: String,
    created_at_ms: i64,
    extra: serde_json::Value,
}

impl AnchorRow {
    fn into_record(self) -> Result<AnchorRecord, sqlx::Error> {
        let network: Network = self.network.parse().map_err(decode_error)?;
        let extra = match self.extra {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(sqlx::Error::Protocol(format!(
                    "anchor extra must be a JSON object, found {other}"
                )))
            }
        };
        Ok(AnchorRecord {
            content_hash: ContentHash::new(self.content_hash).map_err(decode_error)?,
            certificate_id: CertificateId::new(self.certificate_id).map_err(decode_error)?,
            network,
            block_number: self.block_number.map(u64::try_from).transpose().map_err(decode_error)?,
            block_hash: self.block_hash,
            block_timestamp_ms: self
                .block_timestamp_ms
                .map(u64::try_from)
                .transpose()
                .map_err(decode_error)?,
            canonical_digest: self.canonical_digest,
            created_at_ms: self.created_at_ms,
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(network: &str) -> AnchorRow {
        AnchorRow {
            certificate_id: "CERT-1".to_string(),
            content_hash: "abc123".to_string(),
            network: network.to_string(),
            block_number: None,
            block_hash: None,
            block_timestamp_ms: None,
            canonical_digest: "00".repeat(32),
            created_at_ms: 1_700_000_000_000,
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn network_column_uses_wire_names() {
        for network in [
            Network::Ethereum,
            Network::Polygon,
            Network::Arbitrum,
            Network::LocalVerifiable,
        ] {
            let wire = serde_json::to_value(network).unwrap();
            assert_eq!(wire.as_str(), Some(network.as_str()));
            assert_eq!(row(network.as_str()).into_record().unwrap().network, network);
        }
    }

    #[test]
    fn unknown_network_column_is_a_decode_error() {
        assert!(row("solana").into_record().is_err());
    }
}
