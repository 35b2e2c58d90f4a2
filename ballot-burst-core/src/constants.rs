use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:80/api/v1";
pub const DEFAULT_ELECTION_NAME: &str = "test-election";
pub const DEFAULT_ELECTION_START: &str = "2006-01-02 15:04:05";
pub const DEFAULT_ELECTION_END: &str = "2026-05-02 15:04:05";
pub const DEFAULT_CANDIDATE_COUNT: usize = 5;
pub const DEFAULT_TOTAL_VOTERS: usize = 2000;

/// The default maximum failure rate; a run passes only if it stays strictly below it.
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.05;

/// Maximum number of in-flight requests per provisioning batch.
pub const DEFAULT_BATCH_PARALLELISM: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(20) };

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ELECTION_PATH: &str = "election";
pub const CANDIDATE_PATH: &str = "candidate";
pub const VOTER_PATH: &str = "voter";
pub const AUTHENTICATE_PATH: &str = "authenticate";
pub const VOTE_PATH: &str = "vote";

pub const ADMIN_ROLE: &str = "admin";
pub const VOTER_ROLE: &str = "user";
