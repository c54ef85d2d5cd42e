//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Prooff API",
        version = "0.3.0",
        description = "Proof-of-authorship anchoring.\n\nAnchors bind a work's content hash to a public blockchain block header (Ethereum, then Polygon), falling back to a local timestamp when no chain answers. Certificates carry their anchor and an optional Ed25519 creator signature.\n\nChain reads trust the configured JSON-RPC providers; there is no light-client proof.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::anchors::create_anchor,
        crate::routes::anchors::get_anchor,
        crate::routes::anchors::verify_stored_anchor,
        crate::routes::anchors::verify_supplied_record,
        crate::routes::certificates::issue_certificate,
        crate::routes::certificates::get_certificate,
        crate::routes::certificates::verify_certificate,
        crate::routes::wallets::create_wallet,
        crate::routes::wallets::get_wallet,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::anchors::CreateAnchorRequest,
            crate::routes::anchors::VerifyRecordRequest,
            crate::routes::certificates::IssueCertificateRequest,
        ),
    ),
    tags(
        (name = "anchors", description = "Anchor creation and verification"),
        (name = "certificates", description = "Certificates of authorship"),
        (name = "wallets", description = "Creator signing wallets"),
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Prooff API");
        assert!(spec.servers.is_some());
    }

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/anchors",
            "/v1/anchors/{certificate_id}",
            "/v1/anchors/{certificate_id}/verify",
            "/v1/anchors/verify",
            "/v1/certificates",
            "/v1/certificates/{id}",
            "/v1/certificates/{id}/verify",
            "/v1/wallets",
            "/v1/wallets/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_serializes_to_json() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("CreateAnchorRequest"));
    }
}
