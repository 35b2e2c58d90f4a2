use std::fmt;
use std::time::Duration;

/// Voter account identifier, used as both username and password.
pub fn voter_id(index: usize) -> String {
    format!("user{index}")
}

/// Candidate identifier derived from the voter account the candidate stands as.
pub fn candidate_id(index: usize) -> String {
    format!("candidate.{}", voter_id(index))
}

/// Display name of the candidate at `index`.
pub fn candidate_name(index: usize) -> String {
    format!("candidate.{index}")
}

/// Opaque bearer token issued to a voter at login.
#[derive(Clone, PartialEq, Eq)]
pub struct VoterToken(String);

impl VoterToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VoterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VoterToken(<redacted>)")
    }
}

/// The fixture a run operates on. Built once during setup and shared read-only by every worker.
///
/// `candidate_ids` and `voter_tokens` keep one slot per provisioned index. A slot is `None` when
/// its candidate could not be created or its voter could not log in, so index `i` always refers
/// to `candidate.user<i>` and `user<i>` respectively.
#[derive(Debug)]
pub struct ExecutionContext {
    election_id: String,
    candidate_ids: Vec<Option<String>>,
    voter_tokens: Vec<Option<VoterToken>>,
}

impl ExecutionContext {
    pub fn new(
        election_id: String,
        candidate_ids: Vec<Option<String>>,
        voter_tokens: Vec<Option<VoterToken>>,
    ) -> Self {
        Self {
            election_id,
            candidate_ids,
            voter_tokens,
        }
    }

    pub fn election_id(&self) -> &str {
        &self.election_id
    }

    pub fn candidate_ids(&self) -> &[Option<String>] {
        &self.candidate_ids
    }

    pub fn voter_tokens(&self) -> &[Option<VoterToken>] {
        &self.voter_tokens
    }

    /// Deterministic mapping of a worker onto the fixture.
    ///
    /// Returns `None` only if the fixture holds no voters or no candidates.
    pub fn assign(&self, worker_index: usize) -> Option<Assignment> {
        let voter_index = worker_index.checked_rem(self.voter_tokens.len())?;
        let candidate_index = worker_index.checked_rem(self.candidate_ids.len())?;
        Some(Assignment {
            worker_index,
            voter_index,
            candidate_index,
        })
    }

    pub fn token(&self, assignment: &Assignment) -> Option<&VoterToken> {
        self.voter_tokens
            .get(assignment.voter_index)
            .and_then(Option::as_ref)
    }

    pub fn candidate(&self, assignment: &Assignment) -> Option<&str> {
        self.candidate_ids
            .get(assignment.candidate_index)
            .and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub worker_index: usize,
    pub voter_index: usize,
    pub candidate_index: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VoteOutcome {
    Accepted,
    AlreadyVoted,
    Unauthorized,
    Failed,
}

impl VoteOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => VoteOutcome::Accepted,
            409 => VoteOutcome::AlreadyVoted,
            401 => VoteOutcome::Unauthorized,
            _ => VoteOutcome::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, VoteOutcome::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteOutcome::Accepted => "accepted",
            VoteOutcome::AlreadyVoted => "already_voted",
            VoteOutcome::Unauthorized => "unauthorized",
            VoteOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for VoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single worker did and how it ended.
#[derive(Debug, Clone)]
pub struct VoteRecord {
    pub worker_index: usize,
    pub assignment: Option<Assignment>,
    pub outcome: VoteOutcome,
    /// HTTP status of the vote, absent if no response was received.
    pub status: Option<u16>,
    /// Round-trip time of the vote request, absent if none was sent.
    pub latency: Option<Duration>,
}

impl VoteRecord {
    pub fn unsent(worker_index: usize, assignment: Option<Assignment>) -> Self {
        Self {
            worker_index,
            assignment,
            outcome: VoteOutcome::Failed,
            status: None,
            latency: None,
        }
    }
}
