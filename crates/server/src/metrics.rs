//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; call, poll and provider metrics are
//! defined in `ringback_core::metrics` and registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
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
///
/// The upper buckets cover blocking call starts, which wait for the whole
/// call to finish.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ringback_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ringback_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ringback_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    ringback_core::metrics::register_core_metrics(registry);
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

static PHONE_NUMBER_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/(transcript|number)/[^/]+").unwrap());

static EXECUTION_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/executions/[^/]+").unwrap());

/// Normalize a path for metric labels (replace phone numbers and execution
/// ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = PHONE_NUMBER_SEGMENT.replace_all(path, |caps: &regex_lite::Captures| {
        format!("/{}/{{phone}}", &caps[1])
    });
    let result = EXECUTION_SEGMENT.replace_all(&result, "/executions/{id}");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_transcript() {
        let path = "/api/phone/transcript/+15551234567";
        assert_eq!(normalize_path(path), "/api/phone/transcript/{phone}");
    }

    #[test]
    fn test_normalize_path_latest_execution() {
        let path = "/api/phone/number/+15551234567/execution";
        assert_eq!(normalize_path(path), "/api/phone/number/{phone}/execution");
    }

    #[test]
    fn test_normalize_path_execution_log() {
        let path = "/api/phone/executions/550e8400-e29b-41d4/log";
        assert_eq!(normalize_path(path), "/api/phone/executions/{id}/log");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/health"), "/api/health");
        assert_eq!(normalize_path("/api/phone/number"), "/api/phone/number");
        assert_eq!(
            normalize_path("/api/phone/number-nonblocking"),
            "/api/phone/number-nonblocking"
        );
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("ringback_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vec metrics that have at least one label set
        ringback_core::metrics::CALLS_STARTED
            .with_label_values(&["started"])
            .inc_by(0);
        ringback_core::metrics::POLL_ATTEMPTS
            .with_label_values(&["pending"])
            .inc_by(0);
        HTTP_REQUESTS_IN_FLIGHT.set(0);

        let output = encode_metrics();

        assert!(output.contains("ringback_http_requests_in_flight"));
        assert!(output.contains("ringback_calls_started_total"));
        assert!(output.contains("ringback_poll_attempts_total"));
        assert!(output.contains("ringback_transcripts_persisted_total"));
        assert!(output.contains("ringback_detached_watchers_active"));
    }
}
