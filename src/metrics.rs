// Metrics and observability module
// Prometheus collectors for route resolution, candidate generation,
// upstream calls and the live update watchers
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Encoder,
    Histogram, HistogramVec, TextEncoder,
};

pub static RESOLVE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_resolve_latency_seconds",
        "end to end route resolution latency",
        &["send_type"]
    )
    .unwrap()
});

pub static RESOLVE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_resolve_failures_total",
        "failed resolutions by error code",
        &["code"]
    )
    .unwrap()
});

pub static CANDIDATE_COUNT: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "router_candidates",
        "candidate paths per resolution",
        vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]
    )
    .unwrap()
});

pub static RPC_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_upstream_latency_seconds",
        "latency for upstream calls",
        &["service", "method"]
    )
    .unwrap()
});

pub static RPC_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_upstream_errors_total",
        "errors by upstream",
        &["service", "method"]
    )
    .unwrap()
});

pub static ROUTE_REFRESHES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_route_refreshes_total",
        "active route refreshes by chain",
        &["chain_id"]
    )
    .unwrap()
});

/// Text exposition of the default registry.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
