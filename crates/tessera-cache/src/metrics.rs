//! Metrics emitted by the cache layer.

use metrics::{counter, describe_counter};

/// Metric names for the cache layer.
pub mod names {
    /// Failures absorbed by best-effort operations, labelled by operation.
    pub const FAILURES_TOTAL: &str = "tessera_cache_failures_total";
}

/// Register metric descriptions with the installed recorder.
pub fn register_metrics() {
    describe_counter!(
        names::FAILURES_TOTAL,
        "Total number of store failures absorbed by best-effort cache operations"
    );
}

/// Record an absorbed failure.
pub(crate) fn record_failure(operation: &'static str) {
    counter!(names::FAILURES_TOTAL, "operation" => operation).increment(1);
}
