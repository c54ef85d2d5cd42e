//! # Database Persistence Layer
//!
//! Postgres persistence for anchors, certificates and creator wallets via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set, every record is
//! written through to Postgres and the in-memory stores are hydrated from it
//! on startup. When absent, the API runs in-memory only, which suits
//! development and tests.
//!
//! Anchor records are immutable: the `anchor_records` primary key on
//! `certificate_id` is what makes a second anchor for the same certificate
//! fail across processes.

pub mod anchors;
pub mod certificates;
pub mod wallets;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. \
                 Anchors will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Map a decoding failure on a stored row to a SQLx error.
pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}
