//! Store metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total store requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "mediaq_store_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "mediaq_store_latency_seconds";

    /// Fetches that hit the read deadline and degraded to absent.
    pub const FETCH_DEADLINE_TOTAL: &str = "mediaq_store_fetch_deadline_total";

    /// Result entries dropped by boundary validation.
    pub const RESULTS_DROPPED_TOTAL: &str = "mediaq_store_results_dropped_total";
}

/// Record metrics for a completed store request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a fetch that timed out and was reported as absent.
pub fn record_fetch_deadline() {
    counter!(names::FETCH_DEADLINE_TOTAL).increment(1);
}

/// Record result entries silently dropped by validation.
pub fn record_dropped_results(count: usize) {
    if count > 0 {
        counter!(names::RESULTS_DROPPED_TOTAL).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_namespaced() {
        assert!(names::REQUESTS_TOTAL.starts_with("mediaq_store_"));
        assert!(names::LATENCY_SECONDS.starts_with("mediaq_store_"));
        assert!(names::FETCH_DEADLINE_TOTAL.starts_with("mediaq_store_"));
    }
}
