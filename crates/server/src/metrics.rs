//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the trackfetch server:
//! - HTTP request metrics (latency, counts)
//! - Log stream (SSE) connection metrics
//! - Orchestrator queue depth (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trackfetch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "trackfetch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Log Stream Metrics
// =============================================================================

/// Open log stream connections.
pub static LOG_STREAMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "trackfetch_log_streams_active",
        "Number of connected job log stream clients",
    )
    .unwrap()
});

/// Log stream connections since startup.
pub static LOG_STREAMS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trackfetch_log_streams_total",
        "Total job log stream connections since startup",
    )
    .unwrap()
});

/// Tracked jobs (any state), collected on scrape.
pub static TRACKED_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("trackfetch_jobs_tracked", "Jobs currently held in history").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Log stream
    registry
        .register(Box::new(LOG_STREAMS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(LOG_STREAMS_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(TRACKED_JOBS.clone())).unwrap();

    // Core metrics (orchestrator, resolution, processes)
    for metric in trackfetch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges that are read from application state rather than updated
/// as events happen.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let stats = state.orchestrator().stats();
    TRACKED_JOBS.set(stats.jobs.len() as i64);
    trackfetch_core::metrics::ACTIVE_JOBS.set(stats.active_jobs as i64);
    trackfetch_core::metrics::QUEUED_JOBS.set(stats.queue_length as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    static JOB_ID: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/jobs/[^/]+").unwrap());
    static TRACK_ID: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/tracks/[^/]+").unwrap());
    static DOWNLOAD_FILE: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"^/downloads/.+").unwrap());

    let result = JOB_ID.replace_all(path, "/jobs/{id}");
    let result = TRACK_ID.replace_all(&result, "/tracks/{id}");
    let result = DOWNLOAD_FILE.replace_all(&result, "/downloads/{file}");
    result.to_string()
}
