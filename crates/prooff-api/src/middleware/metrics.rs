//! # Prometheus Metrics
//!
//! HTTP request counts and latency are recorded by [`metrics_middleware`].
//! Anchoring counters (anchors created, failed probe stages, verification
//! outcomes) are pushed by the handlers. Store sizes are gauges refreshed on
//! each `/metrics` scrape.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    core::Collector, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use prooff_anchor::{AnchorOutcome, Attempt, Network};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,

    anchors_created_total: IntCounterVec,
    probe_failures_total: IntCounterVec,
    verifications_total: IntCounterVec,

    anchor_records: Gauge,
    certificates: Gauge,
    wallets: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("prooff_http_requests_total", "Total HTTP requests"),
            &["method", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "prooff_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["method"],
        )
        .expect("metric can be created");

        let anchors_created_total = IntCounterVec::new(
            Opts::new("prooff_anchors_created_total", "Anchors created by network"),
            &["network"],
        )
        .expect("metric can be created");

        let probe_failures_total = IntCounterVec::new(
            Opts::new(
                "prooff_probe_failures_total",
                "Fallback stages that failed during anchor creation",
            ),
            &["network"],
        )
        .expect("metric can be created");

        let verifications_total = IntCounterVec::new(
            Opts::new("prooff_verifications_total", "Verifications by outcome"),
            &["outcome"],
        )
        .expect("metric can be created");

        let anchor_records = Gauge::new("prooff_anchor_records", "Anchor records held in memory")
            .expect("metric can be created");
        let certificates = Gauge::new("prooff_certificates", "Certificates held in memory")
            .expect("metric can be created");
        let wallets = Gauge::new("prooff_wallets", "Creator wallets held in memory")
            .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(anchors_created_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(probe_failures_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(verifications_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(anchor_records.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(certificates.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(wallets.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                anchors_created_total,
                probe_failures_total,
                verifications_total,
                anchor_records,
                certificates,
                wallets,
            }),
        }
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_requests_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    fn record_request(&self, method: &str, status: u16, duration_secs: f64) {
        self.inner
            .http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    /// Count a created anchor and the stages that failed before it.
    pub fn record_anchor(&self, network: Network, attempts: &[Attempt]) {
        self.inner
            .anchors_created_total
            .with_label_values(&[network.as_str()])
            .inc();
        for attempt in attempts {
            self.inner
                .probe_failures_total
                .with_label_values(&[attempt.network.as_str()])
                .inc();
        }
    }

    pub fn record_anchor_outcome(&self, outcome: &AnchorOutcome) {
        self.record_anchor(outcome.record.network, &outcome.attempts);
    }

    pub fn record_verification(&self, outcome: &str) {
        self.inner
            .verifications_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Current value of `prooff_anchors_created_total{network}`.
    pub fn anchors_created(&self, network: Network) -> u64 {
        self.inner
            .anchors_created_total
            .with_label_values(&[network.as_str()])
            .get()
    }

    /// Current value of `prooff_verifications_total{outcome}`.
    pub fn verifications(&self, outcome: &str) -> u64 {
        self.inner
            .verifications_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Refresh the store-size gauges before a scrape.
    pub fn set_store_sizes(&self, anchor_records: usize, certificates: usize, wallets: usize) {
        self.inner.anchor_records.set(anchor_records as f64);
        self.inner.certificates.set(certificates as f64);
        self.inner.wallets.set(wallets as f64);
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(&method, response.status().as_u16(), start.elapsed().as_secs_f64());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.anchors_created(Network::Ethereum), 0);
    }

    #[test]
    fn requests_increment() {
        let m = ApiMetrics::new();
        m.record_request("GET", 200, 0.01);
        m.record_request("POST", 201, 0.02);
        m.record_request("POST", 409, 0.02);
        assert_eq!(m.requests(), 3);
    }

    #[test]
    fn anchor_counts_failed_stages_per_network() {
        let m = ApiMetrics::new();
        let attempts = vec![
            Attempt {
                network: Network::Ethereum,
                reason: "HTTP 503".to_string(),
            },
            Attempt {
                network: Network::Polygon,
                reason: "timed out".to_string(),
            },
        ];
        m.record_anchor(Network::LocalVerifiable, &attempts);
        assert_eq!(m.anchors_created(Network::LocalVerifiable), 1);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("prooff_probe_failures_total{network=\"ethereum\"} 1"));
        assert!(text.contains("prooff_probe_failures_total{network=\"polygon\"} 1"));
    }

    #[test]
    fn encoded_output_names_every_family() {
        let m = ApiMetrics::new();
        m.record_request("GET", 200, 0.001);
        m.record_anchor(Network::Polygon, &[]);
        m.record_verification("valid");
        m.set_store_sizes(1, 0, 0);
        let text = m.gather_and_encode().unwrap();
        for name in [
            "prooff_http_requests_total",
            "prooff_http_request_duration_seconds",
            "prooff_anchors_created_total",
            "prooff_verifications_total",
            "prooff_anchor_records",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
    }

    #[test]
    fn concurrent_increments_are_safe() {
        let m = ApiMetrics::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        m.record_verification("digest_mismatch");
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(m.verifications("digest_mismatch"), 4000);
    }
}
