//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request metrics and anchoring counters.
//!
//! Request tracing uses `tower_http::trace::TraceLayer` directly in
//! [`crate::app`].

pub mod metrics;
