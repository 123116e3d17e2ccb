// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zonekeeper.
//!
//! All metrics use the `zonekeeper_` prefix and live in [`METRICS_REGISTRY`].
//! The CLI writes them in text exposition format for the node-exporter textfile
//! collector.
//!
//! # Metrics Categories
//!
//! - **Operation Metrics** - Engine operations by outcome and duration
//! - **Zone Metrics** - Commits, deletions, render time, current serial
//! - **Daemon Metrics** - Reload/reconfig requests by outcome
//! - **Validation Metrics** - Rejected inputs by record type
//!
//! # Example
//!
//! ```rust,no_run
//! use zonekeeper::metrics::{gather_metrics, record_commit_success};
//!
//! record_commit_success("example.test", 2024010100);
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("zonekeeper_zone_serial"));
//! ```

use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all zonekeeper metrics
const METRICS_NAMESPACE: &str = "zonekeeper";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Operation Metrics
// ============================================================================

/// Total number of engine operations by operation and status
///
/// Labels:
/// - `operation`: Engine entry point (e.g., `create_record`, `synchronize`)
/// - `status`: `success` or the error reason (e.g., `ValidationFailed`)
pub static OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_operations_total"),
        "Total number of engine operations by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of engine operations in seconds
///
/// Labels:
/// - `operation`: Engine entry point
pub static OPERATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_operation_duration_seconds"),
        "Duration of engine operations in seconds by operation",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Zone Metrics
// ============================================================================

/// Total number of zone file commits by outcome
///
/// Labels:
/// - `outcome`: `success` or `error`
pub static ZONE_COMMITS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_commits_total"),
        "Total number of zone file commits by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of zones deleted
pub static ZONE_DELETIONS_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let counter = Counter::new(
        format!("{METRICS_NAMESPACE}_zone_deletions_total"),
        "Total number of zones deleted",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent rendering zone text in seconds
pub static RENDER_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_render_duration_seconds"),
        "Time spent rendering zone text in seconds",
    )
    .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Serial of the last committed zone file
///
/// Labels:
/// - `zone`: Zone name
pub static ZONE_SERIAL: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_serial"),
        "Serial of the last committed zone file",
    );
    let gauge = GaugeVec::new(opts, &["zone"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Daemon Metrics
// ============================================================================

/// Total number of daemon control requests by command and outcome
///
/// Labels:
/// - `command`: `reload` or `reconfig`
/// - `outcome`: `success` or `error`
pub static DAEMON_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_daemon_requests_total"),
        "Total number of daemon control requests by command and outcome",
    );
    let counter = CounterVec::new(opts, &["command", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Validation Metrics
// ============================================================================

/// Total number of rejected inputs
///
/// Labels:
/// - `record_type`: Record type of the rejected input (`domain` for zone names)
/// - `field`: Rejected field (`name`, `content`, ...)
pub static VALIDATION_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_validation_failures_total"),
        "Total number of rejected inputs by record type and field",
    );
    let counter = CounterVec::new(opts, &["record_type", "field"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful engine operation
pub fn record_operation_success(operation: &str, duration: Duration) {
    OPERATIONS_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed engine operation
///
/// # Arguments
/// * `operation` - Engine entry point
/// * `reason` - Stable error reason (`ZoneError::status_reason`)
/// * `duration` - Time spent before failing
pub fn record_operation_error(operation: &str, reason: &str, duration: Duration) {
    OPERATIONS_TOTAL.with_label_values(&[operation, reason]).inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record time spent rendering one zone
pub fn record_render(duration: Duration) {
    RENDER_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a committed zone file and its serial
pub fn record_commit_success(zone: &str, serial: u32) {
    ZONE_COMMITS_TOTAL.with_label_values(&["success"]).inc();
    ZONE_SERIAL.with_label_values(&[zone]).set(f64::from(serial));
}

/// Record a failed commit
pub fn record_commit_error() {
    ZONE_COMMITS_TOTAL.with_label_values(&["error"]).inc();
}

/// Record a deleted zone and drop its serial series
pub fn record_zone_deleted(zone: &str) {
    ZONE_DELETIONS_TOTAL.inc();
    let _ = ZONE_SERIAL.remove_label_values(&[zone]);
}

/// Record a daemon control request
pub fn record_daemon_request(command: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    DAEMON_REQUESTS_TOTAL
        .with_label_values(&[command, outcome])
        .inc();
}

/// Record a rejected input
pub fn record_validation_failure(record_type: &str, field: &str) {
    VALIDATION_FAILURES_TOTAL
        .with_label_values(&[record_type, field])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operation_success() {
        let operation = "test_operation_success";
        record_operation_success(operation, Duration::from_millis(5));

        let counter = OPERATIONS_TOTAL.with_label_values(&[operation, "success"]);
        assert!(counter.get() > 0.0);
        let histogram = OPERATION_DURATION_SECONDS.with_label_values(&[operation]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_operation_error_uses_reason_label() {
        let operation = "test_operation_error";
        record_operation_error(operation, "LockTimeout", Duration::from_millis(5));

        let counter = OPERATIONS_TOTAL.with_label_values(&[operation, "LockTimeout"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_commit_sets_serial_gauge() {
        record_commit_success("metrics-serial.test", 42);
        let gauge = ZONE_SERIAL.with_label_values(&["metrics-serial.test"]);
        assert!((gauge.get() - 42.0).abs() < f64::EPSILON);
        assert!(ZONE_COMMITS_TOTAL.with_label_values(&["success"]).get() > 0.0);
    }

    #[test]
    fn test_zone_deleted_drops_serial() {
        record_commit_success("metrics-deleted.test", 7);
        let before = ZONE_DELETIONS_TOTAL.get();
        record_zone_deleted("metrics-deleted.test");

        assert!(ZONE_DELETIONS_TOTAL.get() > before);
        let text = gather_metrics().unwrap();
        assert!(!text.contains("metrics-deleted.test"));
    }

    #[test]
    fn test_daemon_and_validation_counters() {
        record_daemon_request("test_reload", false);
        assert!(
            DAEMON_REQUESTS_TOTAL
                .with_label_values(&["test_reload", "error"])
                .get()
                > 0.0
        );

        record_validation_failure("TEST", "content");
        assert!(
            VALIDATION_FAILURES_TOTAL
                .with_label_values(&["TEST", "content"])
                .get()
                > 0.0
        );
    }

    #[test]
    fn test_gather_metrics_uses_prefix() {
        record_render(Duration::from_micros(250));
        let text = gather_metrics().unwrap();
        assert!(text.contains("zonekeeper_render_duration_seconds"));
    }
}
