//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from prooff-anchor, prooff-crypto and prooff-core to
//! HTTP status codes with a JSON body. Server-side failures are logged and
//! their details are never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prooff_anchor::AnchorError;
use prooff_crypto::VaultError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict with an existing resource (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Logged, not returned to the client.
    #[error("internal error: {0}")]
    Internal(String),

    /// A direct chain probe failed (502).
    #[error("upstream chain error: {0}")]
    UpstreamError(String),

    /// A required dependency is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream chain error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream chain error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<prooff_core::ValidationError> for AppError {
    fn from(err: prooff_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AnchorError> for AppError {
    fn from(err: AnchorError) -> Self {
        match err {
            AnchorError::InvalidInput(_) | AnchorError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            AnchorError::AlreadyAnchored { .. } => Self::Conflict(err.to_string()),
            AnchorError::NotFound { .. } => Self::NotFound(err.to_string()),
            AnchorError::Probe(_) => Self::UpstreamError(err.to_string()),
            AnchorError::Encoding(_) | AnchorError::Store(_) | AnchorError::Config(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// A locked vault is an unprovisioned dependency. Every other vault failure
/// means stored key material is unusable.
impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Locked => Self::ServiceUnavailable(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
