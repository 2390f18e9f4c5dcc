//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job runner (runs, durations, retries)
//! - Organizer (placed files, lifecycle writes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Finished job runs by queue and result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelkeeper_jobs_total", "Total job runs"),
        &["queue", "result"], // "completed", "retried", "failed"
    )
    .unwrap()
});

/// Duration of a single job attempt in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelkeeper_job_duration_seconds",
            "Duration of a job attempt",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
        &["queue"],
    )
    .unwrap()
});

// =============================================================================
// Organizer
// =============================================================================

/// Files placed into the library, by strategy.
pub static FILES_PLACED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelkeeper_files_placed_total",
            "Total files placed into the library",
        ),
        &["strategy"], // "link", "move", "copy"
    )
    .unwrap()
});

/// Committed media state writes, by target state.
pub static MEDIA_STATE_CHANGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelkeeper_media_state_changes_total",
            "Total media state writes committed by organize jobs",
        ),
        &["state"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(FILES_PLACED.clone()),
        Box::new(MEDIA_STATE_CHANGES.clone()),
    ]
}
