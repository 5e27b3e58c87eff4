//! Submission counters, reported by `GET /health`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Provider created an evaluation
    Accepted,
    /// Malformed body or failed validation
    Invalid,
    /// Provider answered with a non-201 status
    ProviderError,
    /// Provider unreachable
    Unavailable,
    /// Provider call timed out
    TimedOut,
    /// Anything else
    Unexpected,
}

/// Gateway metrics
#[derive(Default)]
pub struct GatewayMetrics {
    pub submissions_total: AtomicU64,
    pub submissions_accepted: AtomicU64,
    pub submissions_invalid: AtomicU64,
    pub provider_errors: AtomicU64,
    pub provider_unavailable: AtomicU64,
    pub provider_timeouts: AtomicU64,
    pub unexpected_errors: AtomicU64,

    // Latency of provider calls (simplified - in production use histograms)
    pub provider_latency_ms_total: AtomicU64,
    pub provider_calls: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the end of a submission
    pub fn record_submission(&self, result: SubmissionResult) {
        self.submissions_total.fetch_add(1, Ordering::Relaxed);

        let counter = match result {
            SubmissionResult::Accepted => &self.submissions_accepted,
            SubmissionResult::Invalid => &self.submissions_invalid,
            SubmissionResult::ProviderError => &self.provider_errors,
            SubmissionResult::Unavailable => &self.provider_unavailable,
            SubmissionResult::TimedOut => &self.provider_timeouts,
            SubmissionResult::Unexpected => &self.unexpected_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one provider round trip
    pub fn record_provider_latency(&self, latency_ms: u64) {
        self.provider_latency_ms_total
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average provider latency in ms
    pub fn average_provider_latency_ms(&self) -> f64 {
        let total = self.provider_latency_ms_total.load(Ordering::Relaxed);
        let count = self.provider_calls.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "submissions": {
                "total": self.submissions_total.load(Ordering::Relaxed),
                "accepted": self.submissions_accepted.load(Ordering::Relaxed),
                "invalid": self.submissions_invalid.load(Ordering::Relaxed),
            },
            "provider": {
                "calls": self.provider_calls.load(Ordering::Relaxed),
                "errors": self.provider_errors.load(Ordering::Relaxed),
                "unavailable": self.provider_unavailable.load(Ordering::Relaxed),
                "timeouts": self.provider_timeouts.load(Ordering::Relaxed),
                "average_latency_ms": self.average_provider_latency_ms(),
            },
            "unexpected": self.unexpected_errors.load(Ordering::Relaxed),
        })
    }
}

/// Provider call timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self) {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.metrics.record_provider_latency(latency_ms);
    }
}
