//! # Submission Metrics
//!
//! Prometheus counters for the submission pipeline. All metrics live in a
//! dedicated [`prometheus::Registry`] (prefix `tickcast`) so they never
//! collide with a process-global registry. Text exposition is available via
//! [`SubmissionMetrics::encode`].

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metric handles shared by every orchestrator of a process.
///
/// Clone-friendly: prometheus handles are `Arc`s internally.
#[derive(Clone)]
pub struct SubmissionMetrics {
    registry: Registry,
    /// Broadcasts actually sent to the remote and accepted.
    pub broadcasts_total: IntCounter,
    /// Broadcasts skipped because the TxId was already in the registry.
    pub broadcasts_deduplicated_total: IntCounter,
    /// Retries by operation (`broadcast`, `fetch_latest_tick`, ...).
    pub retries_total: IntCounterVec,
    /// Inclusion polls issued.
    pub poll_attempts_total: IntCounter,
    /// Terminal outcomes by kind (`included`, `abandoned`, `failed`, `cancelled`).
    pub outcomes_total: IntCounterVec,
    /// Wall-clock time from submit to terminal outcome.
    pub submission_duration_seconds: Histogram,
}

impl SubmissionMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tickcast".into()), None)?;

        let broadcasts_total = IntCounter::new(
            "broadcasts_total",
            "Transactions broadcast to the archive and accepted",
        )?;
        registry.register(Box::new(broadcasts_total.clone()))?;

        let broadcasts_deduplicated_total = IntCounter::new(
            "broadcasts_deduplicated_total",
            "Broadcasts skipped because the transaction was already sent",
        )?;
        registry.register(Box::new(broadcasts_deduplicated_total.clone()))?;

        let retries_total = IntCounterVec::new(
            Opts::new("retries_total", "Retried remote calls by operation"),
            &["operation"],
        )?;
        registry.register(Box::new(retries_total.clone()))?;

        let poll_attempts_total =
            IntCounter::new("poll_attempts_total", "Inclusion polls issued")?;
        registry.register(Box::new(poll_attempts_total.clone()))?;

        let outcomes_total = IntCounterVec::new(
            Opts::new("outcomes_total", "Terminal submission outcomes by kind"),
            &["outcome"],
        )?;
        registry.register(Box::new(outcomes_total.clone()))?;

        let submission_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "submission_duration_seconds",
                "Time from submit to terminal outcome in seconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        registry.register(Box::new(submission_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            broadcasts_total,
            broadcasts_deduplicated_total,
            retries_total,
            poll_attempts_total,
            outcomes_total,
            submission_duration_seconds,
        })
    }

    /// Count one retry of `operation`.
    pub fn record_retry(&self, operation: &str) {
        self.retries_total.with_label_values(&[operation]).inc();
    }

    /// Count one terminal outcome.
    pub fn record_outcome(&self, outcome: &str) {
        self.outcomes_total.with_label_values(&[outcome]).inc();
    }

    /// Encode all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for SubmissionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionMetrics")
            .field("broadcasts_total", &self.broadcasts_total.get())
            .field("poll_attempts_total", &self.poll_attempts_total.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_prefixed_names() {
        let metrics = SubmissionMetrics::new().unwrap();
        metrics.broadcasts_total.inc();
        metrics.record_retry("broadcast");
        metrics.record_outcome("included");

        let text = metrics.encode().unwrap();
        assert!(text.contains("tickcast_broadcasts_total 1"));
        assert!(text.contains("tickcast_retries_total{operation=\"broadcast\"} 1"));
        assert!(text.contains("tickcast_outcomes_total{outcome=\"included\"} 1"));
    }

    #[test]
    fn instances_are_independent() {
        let a = SubmissionMetrics::new().unwrap();
        let b = SubmissionMetrics::new().unwrap();
        a.poll_attempts_total.inc();
        assert_eq!(a.poll_attempts_total.get(), 1);
        assert_eq!(b.poll_attempts_total.get(), 0);
    }
}
