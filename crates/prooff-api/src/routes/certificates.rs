//! # Certificate API
//!
//! Issues certificates of authorship, optionally signed by a creator wallet,
//! and verifies them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use prooff_anchor::certificate::MAX_TITLE_LEN;
use prooff_anchor::{Certificate, CertificateVerification, IssueCertificate};
use prooff_core::{CertificateId, ContentHash, WalletId, WorkId};
use prooff_crypto::VaultError;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to issue a certificate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueCertificateRequest {
    #[schema(value_type = String, format = Uuid)]
    pub work_id: WorkId,
    pub title: String,
    #[schema(value_type = String)]
    pub content_hash: ContentHash,
    /// Creator wallet to sign with. Unsigned when absent.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub wallet_id: Option<WalletId>,
}

impl Validate for IssueCertificateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!("title must not exceed {MAX_TITLE_LEN} characters"));
        }
        Ok(())
    }
}

/// Build the certificates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/certificates", post(issue_certificate))
        .route("/v1/certificates/:id", get(get_certificate))
        .route("/v1/certificates/:id/verify", post(verify_certificate))
}

/// POST /v1/certificates: Issue and anchor a certificate.
#[utoipa::path(
    post,
    path = "/v1/certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued"),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 503, description = "Signing requested but no vault key configured", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
async fn issue_certificate(
    State(state): State<AppState>,
    body: Result<Json<IssueCertificateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Certificate>), AppError> {
    let req = extract_validated_json(body)?;

    let signer = match req.wallet_id {
        None => None,
        Some(wallet_id) => {
            let vault = state.vault_key.as_deref().ok_or(VaultError::Locked)?;
            let wallet = state
                .wallets
                .get(&wallet_id)
                .ok_or_else(|| AppError::NotFound(format!("wallet {wallet_id} not found")))?;
            Some(wallet.unlock(vault)?)
        }
    };

    let issued = state
        .issuer
        .issue(IssueCertificate {
            work_id: req.work_id,
            title: req.title,
            content_hash: req.content_hash,
            signer: signer.as_ref(),
        })
        .await?;
    state
        .metrics
        .record_anchor(issued.certificate.anchor.network, &issued.attempts);

    let certificate = issued.certificate;
    state
        .certificates
        .insert(certificate.id.clone(), certificate.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::certificates::insert(pool, &certificate).await {
            tracing::error!(certificate_id = %certificate.id, error = %e, "failed to persist certificate to database");
            return Err(AppError::Internal(
                "certificate recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(certificate)))
}

/// GET /v1/certificates/:id: Fetch a certificate.
#[utoipa::path(
    get,
    path = "/v1/certificates/{id}",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate found"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, AppError> {
    let id = CertificateId::new(id)?;
    state
        .certificates
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("certificate {id} not found")))
}

/// POST /v1/certificates/:id/verify: Verify a certificate's anchor,
/// its binding to the anchor, and its signature.
#[utoipa::path(
    post,
    path = "/v1/certificates/{id}/verify",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate verification"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CertificateVerification>, AppError> {
    let id = CertificateId::new(id)?;
    let certificate = state
        .certificates
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("certificate {id} not found")))?;
    let verification = state.issuer.verify(&certificate).await;
    state.metrics.record_verification(outcome_label(&verification));
    Ok(Json(verification))
}

fn outcome_label(v: &CertificateVerification) -> &'static str {
    if !v.anchor.is_valid {
        v.anchor.outcome()
    } else if !v.anchor_matches_certificate {
        "certificate_mismatch"
    } else if v.signature_valid == Some(false) {
        "signature_invalid"
    } else {
        "valid"
    }
}
