use ballot_burst_core::{OutcomeSummary, DEFAULT_FAILURE_THRESHOLD};

/// Pass/fail decision for a finished run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Verdict {
    pub failure_rate: f64,
    pub passed: bool,
}

/// Judges the vote traffic of a run against a maximum failure rate.
///
/// Only `Failed` outcomes count; `AlreadyVoted` and `Unauthorized` are acceptable under
/// contention.
#[derive(Debug, Copy, Clone)]
pub struct ThresholdEvaluator {
    max_failure_rate: f64,
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl ThresholdEvaluator {
    pub fn new(max_failure_rate: f64) -> Self {
        Self { max_failure_rate }
    }

    pub fn max_failure_rate(&self) -> f64 {
        self.max_failure_rate
    }

    /// `virtual_users` is the number of vote requests the run was meant to make. An empty run
    /// has nothing to fail and passes.
    pub fn evaluate(&self, summary: &OutcomeSummary, virtual_users: usize) -> Verdict {
        let failure_rate = if virtual_users == 0 {
            0.
        } else {
            summary.failed as f64 / virtual_users as f64
        };

        Verdict {
            failure_rate,
            passed: failure_rate < self.max_failure_rate,
        }
    }
}
