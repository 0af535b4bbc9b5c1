//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (enqueued, finished, active and queued jobs)
//! - Resolution (outcomes per strategy, search tool invocations, LLM tokens)
//! - External processes (yt-dlp runs by result)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Jobs accepted by the orchestrator.
pub static JOBS_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("trackfetch_jobs_enqueued_total", "Total download jobs enqueued").unwrap()
});

/// Jobs that reached a terminal state, by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_jobs_finished_total", "Download jobs finished"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Job duration from start to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trackfetch_job_duration_seconds",
            "Duration of download jobs from start to finish",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Jobs currently running.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("trackfetch_jobs_active", "Number of currently running jobs").unwrap()
});

/// Jobs waiting for a slot.
pub static QUEUED_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("trackfetch_jobs_queued", "Number of jobs waiting to run").unwrap()
});

/// Log entries emitted by jobs.
pub static LOG_ENTRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("trackfetch_log_entries_total", "Total job log entries").unwrap()
});

/// Log entries the durable sink failed to write.
pub static LOG_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trackfetch_log_write_failures_total",
        "Job log entries that could not be written to the log file",
    )
    .unwrap()
});

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Resolution outcomes by strategy and result.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_resolutions_total", "Video resolutions"),
        &["strategy", "result"], // "simple" | "agentic", "success" | "failure"
    )
    .unwrap()
});

/// Search provider requests by result.
pub static SEARCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_search_requests_total", "Search provider requests"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

/// LLM token usage.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// External Process Metrics
// =============================================================================

/// External process runs by result.
pub static PROCESS_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_process_runs_total", "External process runs"),
        &["result"], // "success", "exit_error", "spawn_failed", "parse", "timeout"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(JOBS_ENQUEUED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ACTIVE_JOBS.clone()),
        Box::new(QUEUED_JOBS.clone()),
        Box::new(LOG_ENTRIES.clone()),
        Box::new(LOG_WRITE_FAILURES.clone()),
        // Resolution
        Box::new(RESOLUTIONS.clone()),
        Box::new(SEARCH_REQUESTS.clone()),
        Box::new(LLM_TOKENS.clone()),
        // Processes
        Box::new(PROCESS_RUNS.clone()),
    ]
}
