//! # prooff-api: Axum API Services for the Prooff Stack
//!
//! ## API Surface
//!
//! | Prefix               | Module                       | Domain                 |
//! |----------------------|------------------------------|------------------------|
//! | `/v1/anchors/*`      | [`routes::anchors`]          | Anchors                |
//! | `/v1/certificates/*` | [`routes::certificates`]     | Certificates           |
//! | `/v1/wallets/*`      | [`routes::wallets`]          | Creator wallets        |
//! | `/health/*`          | this module                  | Liveness and readiness |
//! | `/metrics`           | this module                  | Prometheus scrape      |
//! | `/openapi.json`      | [`openapi`]                  | OpenAPI document       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! There is no authentication layer; deploy behind a gateway that provides it.

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Check if metrics are enabled via the `PROOFF_METRICS_ENABLED` env var.
/// Defaults to `true` when absent or set to anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("PROOFF_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics_on = metrics_enabled();

    // Body size limit: 256 KiB. Anchor and certificate payloads are small.
    let mut api = Router::new()
        .merge(routes::anchors::router())
        .merge(routes::certificates::router())
        .merge(routes::wallets::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(256 * 1024));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(state.metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        probes = probes
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(state.metrics.clone()));
    }

    let probes = probes.with_state(state);

    Router::new().merge(probes).merge(api)
}

/// GET /metrics: Prometheus text exposition.
///
/// Store-size gauges are refreshed on each scrape.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.set_store_sizes(
        state.anchor_records.len(),
        state.certificates.len(),
        state.wallets.len(),
    );

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// Checks that the database answers when one is configured. Chain endpoints
/// are not probed: anchoring falls back to the local clock, so an unreachable
/// chain does not make the service unready.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
