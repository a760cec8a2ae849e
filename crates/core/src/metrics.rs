//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (submissions, outcomes)
//! - Pipeline stages (durations, degraded stages)
//! - Acquisition (attempts per path, timeouts)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs submitted total.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("stepbeat_jobs_submitted_total", "Total analysis jobs submitted").unwrap()
});

/// Jobs finished total by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stepbeat_jobs_finished_total", "Total analysis jobs finished"),
        &["result"], // "success", "degraded", "failed"
    )
    .unwrap()
});

/// Jobs currently running.
pub static JOBS_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("stepbeat_jobs_running", "Analysis jobs currently running").unwrap()
});

/// End-to-end job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("stepbeat_job_duration_seconds", "Duration of analysis jobs")
            .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Stage Metrics
// =============================================================================

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("stepbeat_stage_duration_seconds", "Duration of pipeline stages")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 180.0]),
        &["stage"],
    )
    .unwrap()
});

/// Non-fatal stage failures replaced by placeholders.
pub static STAGES_DEGRADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stepbeat_stages_degraded_total",
            "Stage failures that were degraded to placeholders",
        ),
        &["stage"], // "detect", "visualize", "click_tracks"
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition attempts by path and result.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stepbeat_acquisition_attempts_total", "Total acquisition attempts"),
        &["path", "result"], // path: "primary", "fallback"; result: "success" or error kind
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_RUNNING.clone()),
        Box::new(JOB_DURATION.clone()),
        // Stages
        Box::new(STAGE_DURATION.clone()),
        Box::new(STAGES_DEGRADED.clone()),
        // Acquisition
        Box::new(ACQUISITION_ATTEMPTS.clone()),
    ]
}
