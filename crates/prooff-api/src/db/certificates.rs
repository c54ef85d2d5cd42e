//! Certificate persistence on the `certificates` table.
//!
//! The full certificate is stored as a JSONB document next to its indexed
//! columns so the signed body round-trips byte-for-byte.

use prooff_anchor::Certificate;
use sqlx::PgPool;

use super::decode_error;

pub async fn insert(pool: &PgPool, certificate: &Certificate) -> Result<(), sqlx::Error> {
    let document = serde_json::to_value(certificate)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize certificate: {e}")))?;

    sqlx::query(
        "INSERT INTO certificates (id, work_id, content_hash, document, issued_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(certificate.id.as_str())
    .bind(certificate.work_id.as_uuid())
    .bind(certificate.content_hash.as_str())
    .bind(&document)
    .bind(certificate.issued_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Certificate>, sqlx::Error> {
    let rows: Vec<(serde_json::Value,)> =
        sqlx::query_as("SELECT document FROM certificates ORDER BY issued_at")
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|(document,)| serde_json::from_value(document).map_err(decode_error))
        .collect()
}
