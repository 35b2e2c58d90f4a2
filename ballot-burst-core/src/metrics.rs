use crate::VoteOutcome;

/// Label key and value tagging vote traffic, so that setup requests never count towards the
/// failure rate.
pub const TRAFFIC_LABEL: &str = "type";
pub const VOTE_TRAFFIC: &str = "vote";

/// Metric names for one kind of classified traffic.
#[derive(Copy, Clone, Debug)]
pub struct OutcomeLabels {
    pub accepted: &'static str,
    pub already_voted: &'static str,
    pub unauthorized: &'static str,
    pub failed: &'static str,
    pub latency: &'static str,
}

impl OutcomeLabels {
    pub fn counter(&self, outcome: VoteOutcome) -> &'static str {
        match outcome {
            VoteOutcome::Accepted => self.accepted,
            VoteOutcome::AlreadyVoted => self.already_voted,
            VoteOutcome::Unauthorized => self.unauthorized,
            VoteOutcome::Failed => self.failed,
        }
    }
}

#[macro_export]
macro_rules! generate_labels {
    ($base_name:expr) => {
        $crate::OutcomeLabels {
            accepted: concat!(stringify!($base_name), "_accepted"),
            already_voted: concat!(stringify!($base_name), "_already_voted"),
            unauthorized: concat!(stringify!($base_name), "_unauthorized"),
            failed: concat!(stringify!($base_name), "_failed"),
            latency: concat!(stringify!($base_name), "_latency"),
        }
    };
}

pub const VOTE_LABELS: OutcomeLabels = generate_labels!(ballot_burst_vote);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_labels() {
        assert_eq!(VOTE_LABELS.accepted, "ballot_burst_vote_accepted");
        assert_eq!(VOTE_LABELS.counter(VoteOutcome::Failed), "ballot_burst_vote_failed");
        assert_eq!(VOTE_LABELS.latency, "ballot_burst_vote_latency");
    }
}
