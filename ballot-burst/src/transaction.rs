use ballot_burst_core::{OutcomeSummary, VoteOutcome, VoteRecord};
#[cfg(feature = "metrics")]
use ballot_burst_core::{TRAFFIC_LABEL, VOTE_LABELS, VOTE_TRAFFIC};
use metrics_util::AtomicBucket;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

/// Shared sink for classified vote outcomes.
///
/// Cloned into every worker; all writes are atomic so workers never wait on each other.
#[derive(Clone)]
pub struct OutcomeRecorder {
    accepted: Arc<AtomicU64>,
    already_voted: Arc<AtomicU64>,
    unauthorized: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    latency: Arc<AtomicBucket<Duration>>,
}

impl Default for OutcomeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self {
            accepted: Arc::new(AtomicU64::new(0)),
            already_voted: Arc::new(AtomicU64::new(0)),
            unauthorized: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            latency: Arc::new(AtomicBucket::new()),
        }
    }

    pub fn record(&self, record: &VoteRecord) {
        self.counter(record.outcome).fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = record.latency {
            self.latency.push(latency);
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(VOTE_LABELS.counter(record.outcome), TRAFFIC_LABEL => VOTE_TRAFFIC)
                .increment(1);
            if let Some(latency) = record.latency {
                metrics::describe_histogram!(VOTE_LABELS.latency, metrics::Unit::Nanoseconds, "");
                metrics::histogram!(VOTE_LABELS.latency, TRAFFIC_LABEL => VOTE_TRAFFIC)
                    .record(latency.as_nanos() as f64);
            }
        }
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            accepted: self.accepted.load(Ordering::Relaxed),
            already_voted: self.already_voted.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn latencies(&self) -> Vec<Duration> {
        self.latency.data()
    }

    fn counter(&self, outcome: VoteOutcome) -> &AtomicU64 {
        match outcome {
            VoteOutcome::Accepted => &self.accepted,
            VoteOutcome::AlreadyVoted => &self.already_voted,
            VoteOutcome::Unauthorized => &self.unauthorized,
            VoteOutcome::Failed => &self.failed,
        }
    }
}
