//! Injected metrics sink for the ingestion pipeline.
//!
//! Components receive the sink at construction instead of touching
//! process-wide counters, so tests can run without a recorder and
//! assert against their own sink when needed.

use metrics::counter;

/// Sink for pipeline-level events.
pub trait IngestMetrics: Send + Sync {
    fn upload(&self, outcome: &str);
    fn status_update(&self, transition: &str);
    fn results_append(&self, appended: usize);
    fn read(&self, source: &str);
}

/// Sink that forwards to the `metrics` facade recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl IngestMetrics for RecorderMetrics {
    fn upload(&self, outcome: &str) {
        counter!("mediaq_ingest_uploads_total", "outcome" => outcome.to_string()).increment(1);
    }

    fn status_update(&self, transition: &str) {
        counter!("mediaq_ingest_status_updates_total", "transition" => transition.to_string())
            .increment(1);
    }

    fn results_append(&self, appended: usize) {
        counter!("mediaq_ingest_results_appended_total").increment(appended as u64);
    }

    fn read(&self, source: &str) {
        counter!("mediaq_ingest_reads_total", "source" => source.to_string()).increment(1);
    }
}

/// Sink that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl IngestMetrics for NoopMetrics {
    fn upload(&self, _outcome: &str) {}
    fn status_update(&self, _transition: &str) {}
    fn results_append(&self, _appended: usize) {}
    fn read(&self, _source: &str) {}
}
