//! # Creator Wallet API
//!
//! Wallet secrets are sealed under the vault key and never leave the server.
//! Responses carry only the public view.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use prooff_core::{Timestamp, WalletId};
use prooff_crypto::{CreatorWallet, VaultError, WalletView};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Build the wallets router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/wallets", post(create_wallet))
        .route("/v1/wallets/:id", get(get_wallet))
}

/// POST /v1/wallets: Generate a creator wallet.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    responses(
        (status = 201, description = "Wallet created: {id, public_key, created_at}"),
        (status = 503, description = "No vault key configured", body = crate::error::ErrorBody),
    ),
    tag = "wallets"
)]
async fn create_wallet(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WalletView>), AppError> {
    let vault = state.vault_key.as_deref().ok_or(VaultError::Locked)?;
    let wallet = CreatorWallet::generate(vault, Timestamp::now())?;
    state.wallets.insert(wallet.id, wallet.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::wallets::insert(pool, &wallet).await {
            tracing::error!(wallet_id = %wallet.id, error = %e, "failed to persist wallet to database");
            return Err(AppError::Internal(
                "wallet recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(wallet_id = %wallet.id, "creator wallet created");
    Ok((StatusCode::CREATED, Json(wallet.view())))
}

/// GET /v1/wallets/:id: Public view of a wallet.
#[utoipa::path(
    get,
    path = "/v1/wallets/{id}",
    params(("id" = Uuid, Path, description = "Wallet ID")),
    responses(
        (status = 200, description = "Wallet found"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "wallets"
)]
async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WalletView>, AppError> {
    let id = WalletId(id);
    state
        .wallets
        .get(&id)
        .map(|w| Json(w.view()))
        .ok_or_else(|| AppError::NotFound(format!("wallet {id} not found")))
}
