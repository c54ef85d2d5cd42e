//! # prooff-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use prooff_anchor::AnchorConfig;
use prooff_api::state::{AppConfig, AppState};
use prooff_crypto::VaultKey;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let anchor = AnchorConfig::from_env().map_err(|e| {
        tracing::error!("Invalid anchoring configuration: {e}");
        e
    })?;
    let config = AppConfig { port, anchor };
    tracing::info!(
        fallback_order = ?config.anchor.fallback_order,
        stage_timeout_secs = config.anchor.stage_timeout_secs,
        "anchoring configured"
    );

    let vault_key = match std::env::var("PROOFF_VAULT_KEY") {
        Ok(hex) => Some(VaultKey::from_hex(hex.trim()).map_err(|e| {
            tracing::error!("PROOFF_VAULT_KEY is unusable: {e}");
            e
        })?),
        Err(_) => {
            tracing::warn!("PROOFF_VAULT_KEY not set; wallet endpoints will return 503");
            None
        }
    };

    // Optional: absent means in-memory only.
    let db_pool = prooff_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::new(&config.anchor, vault_key, db_pool)?;
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = prooff_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Prooff API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
