//! # Anchor API
//!
//! Creates anchors for certificates and verifies stored or caller-supplied
//! anchor records.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use prooff_anchor::{AnchorOutcome, AnchorRecord, AnchorRequest, ExtraFields, VerificationReport};
use prooff_core::{CertificateId, ContentHash};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Upper bound on caller-supplied extra root fields.
pub const MAX_EXTRA_FIELDS: usize = 32;

/// Request to anchor a content hash for a certificate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAnchorRequest {
    /// Hex digest of the work's content.
    #[schema(value_type = String, example = "abc123")]
    pub content_hash: ContentHash,
    #[schema(value_type = String, example = "CERT-1")]
    pub certificate_id: CertificateId,
    /// Extra root fields bound into the canonical digest. Floats and
    /// reserved keys are rejected.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub extra: ExtraFields,
}

impl Validate for CreateAnchorRequest {
    fn validate(&self) -> Result<(), String> {
        if self.extra.len() > MAX_EXTRA_FIELDS {
            return Err(format!("extra must not exceed {MAX_EXTRA_FIELDS} fields"));
        }
        Ok(())
    }
}

/// Request to verify a record the caller holds.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRecordRequest {
    #[schema(value_type = Object)]
    pub record: AnchorRecord,
}

/// Build the anchors router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/anchors", post(create_anchor))
        .route("/v1/anchors/verify", post(verify_supplied_record))
        .route("/v1/anchors/:certificate_id", get(get_anchor))
        .route("/v1/anchors/:certificate_id/verify", post(verify_stored_anchor))
}

/// POST /v1/anchors: Anchor a content hash.
#[utoipa::path(
    post,
    path = "/v1/anchors",
    request_body = CreateAnchorRequest,
    responses(
        (status = 201, description = "Anchor created: {record, explorer_urls, attempts}"),
        (status = 409, description = "Certificate already anchored", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid input", body = crate::error::ErrorBody),
    ),
    tag = "anchors"
)]
async fn create_anchor(
    State(state): State<AppState>,
    body: Result<Json<CreateAnchorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnchorOutcome>), AppError> {
    let req = extract_validated_json(body)?;
    let outcome = state
        .anchors
        .create_anchor(AnchorRequest {
            content_hash: req.content_hash,
            certificate_id: req.certificate_id,
            extra: req.extra,
        })
        .await?;
    state.metrics.record_anchor_outcome(&outcome);
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /v1/anchors/:certificate_id: Fetch a stored anchor record.
#[utoipa::path(
    get,
    path = "/v1/anchors/{certificate_id}",
    params(("certificate_id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Anchor record"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "anchors"
)]
async fn get_anchor(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> Result<Json<AnchorRecord>, AppError> {
    let id = CertificateId::new(certificate_id)?;
    let record = state
        .anchors
        .load(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no anchor found for certificate {id}")))?;
    Ok(Json(record))
}

/// POST /v1/anchors/:certificate_id/verify: Verify a stored anchor.
#[utoipa::path(
    post,
    path = "/v1/anchors/{certificate_id}/verify",
    params(("certificate_id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Verification report"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "anchors"
)]
async fn verify_stored_anchor(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> Result<Json<VerificationReport>, AppError> {
    let id = CertificateId::new(certificate_id)?;
    let report = state.anchors.verify(&id).await?;
    state.metrics.record_verification(report.outcome());
    Ok(Json(report))
}

/// POST /v1/anchors/verify: Verify a record supplied in the body.
#[utoipa::path(
    post,
    path = "/v1/anchors/verify",
    request_body = VerifyRecordRequest,
    responses(
        (status = 200, description = "Verification report"),
        (status = 422, description = "Record could not be parsed", body = crate::error::ErrorBody),
    ),
    tag = "anchors"
)]
async fn verify_supplied_record(
    State(state): State<AppState>,
    body: Result<Json<VerifyRecordRequest>, JsonRejection>,
) -> Result<Json<VerificationReport>, AppError> {
    let req = extract_json(body)?;
    let report = state.anchors.verify_record(&req.record).await;
    state.metrics.record_verification(report.outcome());
    Ok(Json(report))
}
