// =============================================================================
// METRICS MODULE
// =============================================================================
// Prometheus metrics for the catalog.
//
// Besides the usual request counters we track how the upstream behaves and
// how often listings had to fall back to sample data.
// =============================================================================

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// METRIC NAMES
// =============================================================================

/// Labels: method, endpoint, status
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// Labels: method, endpoint
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Labels: operation (page/excel), outcome (ok/error_status/unavailable)
pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str = "upstream_request_duration_seconds";

/// Labels: route
pub const CATALOG_FALLBACK_TOTAL: &str = "catalog_fallback_total";

/// Labels: route
pub const CATALOG_ITEMS_RETURNED: &str = "catalog_items_returned";

// =============================================================================
// SETUP FUNCTION
// =============================================================================
/// Installs the global Prometheus recorder and returns the handle used by
/// `GET /metrics`.
pub fn setup_metrics() -> Result<PrometheusHandle> {
    // Upstream calls are slower than local handlers, so the buckets go further
    let latency_buckets = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(UPSTREAM_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request latency in seconds");
    describe_histogram!(
        UPSTREAM_REQUEST_DURATION_SECONDS,
        "Latency of calls to the upstream stock API in seconds"
    );
    describe_counter!(
        CATALOG_FALLBACK_TOTAL,
        "Listings served from sample data because the upstream was unusable"
    );
    describe_gauge!(CATALOG_ITEMS_RETURNED, "Items in the most recent listing response");

    Ok(handle)
}

/// A handle that is not installed globally. Lets tests build an `AppState`
/// without fighting over the process-wide recorder.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

pub fn record_upstream_request(operation: &str, outcome: &str, duration_secs: f64) {
    histogram!(
        UPSTREAM_REQUEST_DURATION_SECONDS,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);
}

pub fn record_fallback(route: &str) {
    counter!(CATALOG_FALLBACK_TOTAL, "route" => route.to_string()).increment(1);
}

pub fn set_items_returned(route: &str, count: usize) {
    gauge!(CATALOG_ITEMS_RETURNED, "route" => route.to_string()).set(count as f64);
}
