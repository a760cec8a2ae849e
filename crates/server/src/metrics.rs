//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the stepbeat server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Job registry size (collected dynamically)
//! - Core job and stage metrics (registered from `stepbeat_core::metrics`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

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
            "stepbeat_http_request_duration_seconds",
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
        Opts::new("stepbeat_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stepbeat_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Registry Metrics (collected dynamically)
// =============================================================================

/// Jobs tracked by the registry, finished or not.
pub static JOBS_TRACKED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("stepbeat_jobs_tracked", "Number of jobs held in the registry").unwrap()
});

/// Jobs whose task is still running.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("stepbeat_jobs_active", "Number of jobs with a running task").unwrap()
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

    // Registry
    registry.register(Box::new(JOBS_TRACKED.clone())).unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();

    // Core metrics (jobs, stages, acquisition)
    for metric in stepbeat_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let registry = state.registry();
    JOBS_TRACKED.set(registry.len().await as i64);
    JOBS_ACTIVE.set(registry.active_count().await as i64);
}

static ID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(progress|audio|video|thumbnail)/[^/]+").unwrap());
static STATIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(static|videos)/[^/]+/.*$").unwrap());

/// Normalize a path for metric labels (replace job ids and file names).
pub fn normalize_path(path: &str) -> String {
    let result = ID_SEGMENT.replace_all(path, "/$1/{id}");
    let result = STATIC_SEGMENT.replace_all(&result, "/$1/{id}/{file}");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_progress() {
        assert_eq!(normalize_path("/api/progress/dQw4w9WgXcQ"), "/api/progress/{id}");
        assert_eq!(normalize_path("/progress/dQw4w9WgXcQ"), "/progress/{id}");
    }

    #[test]
    fn test_normalize_path_media() {
        assert_eq!(normalize_path("/api/thumbnail/abc-DEF_123"), "/api/thumbnail/{id}");
        assert_eq!(
            normalize_path("/static/dQw4w9WgXcQ/clicks_only.wav"),
            "/static/{id}/{file}"
        );
    }

    #[test]
    fn test_normalize_path_unchanged() {
        assert_eq!(normalize_path("/api/health"), "/api/health");
        assert_eq!(normalize_path("/api/analyze-video"), "/api/analyze-video");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        stepbeat_core::metrics::JOBS_SUBMITTED.inc();
        let text = encode_metrics();
        assert!(text.contains("stepbeat_jobs_submitted_total"));
    }
}
