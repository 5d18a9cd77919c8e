//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Call starts
//! - Completion polling (attempts, wait duration)
//! - Transcript persistence and detached watchers
//! - Requests to the call provider

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Call Metrics
// =============================================================================

/// Call start attempts by result.
pub static CALLS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ringback_calls_started_total", "Total call start attempts"),
        &["result"], // "started", "provider_error", "missing_execution_id", "store_error"
    )
    .unwrap()
});

/// Transcripts written to the store.
pub static TRANSCRIPTS_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ringback_transcripts_persisted_total",
        "Total transcripts written to the store",
    )
    .unwrap()
});

/// Detached watchers currently polling.
pub static DETACHED_WATCHERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ringback_detached_watchers_active",
        "Number of background completion watchers currently running",
    )
    .unwrap()
});

// =============================================================================
// Poller Metrics
// =============================================================================

/// Status fetches by outcome.
pub static POLL_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ringback_poll_attempts_total", "Total execution status fetches"),
        &["outcome"], // "terminal", "pending", "error"
    )
    .unwrap()
});

/// Time spent waiting for an execution to finish.
pub static POLL_WAIT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ringback_poll_wait_duration_seconds",
            "Duration of completion waits",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0, 300.0, 600.0]),
        &["result"], // "completed", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Requests to the call provider by endpoint and result.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ringback_provider_requests_total",
            "Total requests to the call provider",
        ),
        &["endpoint", "result"],
    )
    .unwrap()
});

/// Register all core metrics with the given registry.
pub fn register_core_metrics(registry: &prometheus::Registry) {
    let _ = registry.register(Box::new(CALLS_STARTED.clone()));
    let _ = registry.register(Box::new(TRANSCRIPTS_PERSISTED.clone()));
    let _ = registry.register(Box::new(DETACHED_WATCHERS_ACTIVE.clone()));
    let _ = registry.register(Box::new(POLL_ATTEMPTS.clone()));
    let _ = registry.register(Box::new(POLL_WAIT_DURATION.clone()));
    let _ = registry.register(Box::new(PROVIDER_REQUESTS.clone()));
}
