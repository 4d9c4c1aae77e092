//! Pipeline metrics.
//!
//! Counters are per pipeline (one per page context) rather than global, so
//! concurrent pipelines and tests never share state.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Completed runs, aborted ones included
    runs: AtomicUsize,

    /// Runs aborted before any translation (missing credential, bad settings)
    aborted_runs: AtomicUsize,

    /// Translation calls issued
    api_calls: AtomicUsize,

    /// Translation calls that failed
    api_failures: AtomicUsize,

    /// Annotations attached to the page
    annotations: AtomicUsize,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aborted_run(&self) {
        self.aborted_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_annotation(&self) {
        self.annotations.fetch_add(1, Ordering::Relaxed);
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls.load(Ordering::Relaxed);
        let failures = self.api_failures.load(Ordering::Relaxed);
        let api_success_rate = if calls > 0 {
            ((calls - failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            runs: self.runs.load(Ordering::Relaxed),
            aborted_runs: self.aborted_runs.load(Ordering::Relaxed),
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
            annotations: self.annotations.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub runs: usize,
    pub aborted_runs: usize,
    pub api_calls: usize,
    pub api_failures: usize,

    /// API success rate as a percentage (0-100)
    pub api_success_rate: f64,

    pub annotations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_empty() {
        let report = PipelineMetrics::new().report();
        assert_eq!(report.runs, 0);
        assert_eq!(report.api_calls, 0);
        assert_eq!(report.api_success_rate, 0.0);
    }

    #[test]
    fn test_report_counts() {
        let metrics = PipelineMetrics::new();
        metrics.record_run();
        metrics.record_run();
        metrics.record_aborted_run();
        for _ in 0..4 {
            metrics.record_api_call();
        }
        metrics.record_api_failure();
        metrics.record_annotation();

        let report = metrics.report();
        assert_eq!(report.runs, 2);
        assert_eq!(report.aborted_runs, 1);
        assert_eq!(report.api_calls, 4);
        assert_eq!(report.api_failures, 1);
        assert_eq!(report.annotations, 1);
        assert!((report.api_success_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serialization() {
        let metrics = PipelineMetrics::new();
        metrics.record_api_call();

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["api_calls"], 1);
        assert_eq!(json["api_success_rate"], 100.0);
    }
}
