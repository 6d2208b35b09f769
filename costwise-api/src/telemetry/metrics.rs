//! Prometheus Metrics Definitions
//!
//! Defines all Costwise metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<CostwiseMetrics>> = Lazy::new(CostwiseMetrics::new);

/// Container for all Costwise metrics.
#[derive(Clone)]
pub struct CostwiseMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Cost index lookups - labels: outcome (hit/refresh/stale/error)
    pub cache_lookups_total: CounterVec,

    /// Pricing source fetches - labels: source, outcome
    pub upstream_fetches_total: CounterVec,

    /// Ledger operations - labels: operation, outcome
    pub ledger_operations_total: CounterVec,
}

impl CostwiseMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "costwise_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "costwise_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            cache_lookups_total: register_counter_vec!(
                "costwise_cache_lookups_total",
                "Cost index lookups by outcome",
                &["outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register cache_lookups_total: {}", e)))?,

            upstream_fetches_total: register_counter_vec!(
                "costwise_upstream_fetches_total",
                "Pricing source fetches by outcome",
                &["source", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register upstream_fetches_total: {}", e)))?,

            ledger_operations_total: register_counter_vec!(
                "costwise_ledger_operations_total",
                "Calculation ledger operations by outcome",
                &["operation", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register ledger_operations_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, outcome: &str) {
        self.cache_lookups_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_upstream_fetch(&self, source: &str, outcome: &str) {
        self.upstream_fetches_total
            .with_label_values(&[source, outcome])
            .inc();
    }

    pub fn record_ledger_operation(&self, operation: &str, success: bool) {
        let outcome = if success { "success" } else { "error" };
        self.ledger_operations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }
}

// Free functions that no-op when registration failed, so call sites stay terse.

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(method, path, status, duration_secs);
    }
}

pub fn record_cache_lookup(outcome: &str) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_cache_lookup(outcome);
    }
}

pub fn record_upstream_fetch(source: &str, outcome: &str) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_upstream_fetch(source, outcome);
    }
}

pub fn record_ledger_operation(operation: &str, success: bool) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_ledger_operation(operation, success);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so a scrape before any traffic still lists our families.
    if let Err(e) = METRICS.as_ref() {
        tracing::warn!(error = %e, "Metrics registration failed");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn metrics() -> Result<&'static CostwiseMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = metrics()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_http_request("GET", "/api/cost/:city", 200, 0.015);
        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/api/cost/:city", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_domain_counters() -> Result<(), String> {
        let metrics = metrics()?;
        record_cache_lookup("hit");
        record_upstream_fetch("numbeo", "timeout");
        record_ledger_operation("save", true);

        assert!(metrics.cache_lookups_total.with_label_values(&["hit"]).get() >= 1.0);
        assert!(
            metrics
                .upstream_fetches_total
                .with_label_values(&["numbeo", "timeout"])
                .get()
                >= 1.0
        );
        assert!(
            metrics
                .ledger_operations_total
                .with_label_values(&["save", "success"])
                .get()
                >= 1.0
        );
        Ok(())
    }
}
