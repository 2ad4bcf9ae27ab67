//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): proxied requests by method, status
//! - `proxy_request_duration_seconds` (histogram): proxied request latency
//! - `proxy_upstream_errors_total` (counter): failed upstream calls
//! - `proxy_upstream_ready` (gauge): 1=synced, 0=not ready
//! - `rpc_cache_hits_total` / `rpc_cache_misses_total` (counters)
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxy request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record an upstream call that failed before producing a response.
pub fn record_upstream_error() {
    counter!("proxy_upstream_errors_total").increment(1);
}

/// Record the outcome of a readiness probe.
pub fn record_readiness(ready: bool) {
    gauge!("proxy_upstream_ready").set(if ready { 1.0 } else { 0.0 });
}

/// Record a response cache lookup.
pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("rpc_cache_hits_total").increment(1);
    } else {
        counter!("rpc_cache_misses_total").increment(1);
    }
}
