use crate::{VoteOutcome, VoteRecord};
use std::fmt;
use std::time::Duration;

/// Outcome counts for the vote traffic of a run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub accepted: u64,
    pub already_voted: u64,
    pub unauthorized: u64,
    pub failed: u64,
}

impl OutcomeSummary {
    pub fn from_records(records: &[VoteRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record.outcome);
        }
        summary
    }

    pub fn add(&mut self, outcome: VoteOutcome) {
        match outcome {
            VoteOutcome::Accepted => self.accepted += 1,
            VoteOutcome::AlreadyVoted => self.already_voted += 1,
            VoteOutcome::Unauthorized => self.unauthorized += 1,
            VoteOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.already_voted + self.unauthorized + self.failed
    }

    pub fn count(&self, outcome: VoteOutcome) -> u64 {
        match outcome {
            VoteOutcome::Accepted => self.accepted,
            VoteOutcome::AlreadyVoted => self.already_voted,
            VoteOutcome::Unauthorized => self.unauthorized,
            VoteOutcome::Failed => self.failed,
        }
    }
}

impl fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted={}, already_voted={}, unauthorized={}, failed={}",
            self.accepted, self.already_voted, self.unauthorized, self.failed
        )
    }
}

/// Counts gathered while provisioning the fixture.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub candidates_created: usize,
    pub candidate_failures: usize,
    pub voters_created: usize,
    pub voter_failures: usize,
    pub logins: usize,
    pub login_failures: usize,
}

/// Run Statistics for a completed load test
#[derive(Debug)]
pub struct RunStatistics {
    pub provision: ProvisionReport,
    pub virtual_users: usize,
    pub summary: OutcomeSummary,
    pub failure_rate: f64,
    pub threshold: f64,
    pub passed: bool,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
    pub setup_elapsed: Duration,
    pub run_elapsed: Duration,
    /// One record per worker, ordered by worker index.
    pub records: Vec<VoteRecord>,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), VirtualUsers={}, FailureRate={:.4} (threshold {}), p50={:?}, p90={:?}, p99={:?}, setup={:?}, run={:?}",
            if self.passed { "PASSED" } else { "FAILED" },
            self.summary,
            self.virtual_users,
            self.failure_rate,
            self.threshold,
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
            self.setup_elapsed,
            self.run_elapsed,
        )
    }
}
