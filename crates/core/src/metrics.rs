//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Backend attempts (per backend and outcome)
//! - Backend invocation duration and retrieval outcomes
//! - Format selection quality downgrades

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Backend invocations by backend and outcome.
pub static BACKEND_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidgrab_backend_attempts_total", "Total backend invocations"),
        // "success", "no_compatible_stream", "extraction_failed", "auth_required",
        // "timed_out", "unavailable", "io"
        &["backend", "result"],
    )
    .unwrap()
});

/// Duration of a single backend invocation in seconds.
pub static BACKEND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidgrab_backend_duration_seconds",
            "Duration of a single backend invocation",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["backend"],
    )
    .unwrap()
});

/// Retrievals by terminal outcome.
pub static RETRIEVALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidgrab_retrievals_total", "Total retrieval requests"),
        &["result"], // "success", "validation", "all_failed", "storage"
    )
    .unwrap()
});

// =============================================================================
// Format Selection Metrics
// =============================================================================

/// Merged pairs discarded for lack of a multiplexer.
pub static QUALITY_DOWNGRADES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidgrab_quality_downgrades_total",
        "Merged video+audio pairs skipped because no multiplexer is available",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(BACKEND_ATTEMPTS.clone()),
        Box::new(BACKEND_DURATION.clone()),
        Box::new(RETRIEVALS.clone()),
        Box::new(QUALITY_DOWNGRADES.clone()),
    ]
}
