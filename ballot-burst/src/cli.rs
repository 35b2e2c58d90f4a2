//! Command line surface of the `ballot-burst` binary.
use ballot_burst_core::{
    parse_base_url, AdminAuth, ConfigError, ElectionWindow, LoadTestConfig, DEFAULT_BASE_URL,
    DEFAULT_ELECTION_END, DEFAULT_ELECTION_NAME, DEFAULT_ELECTION_START,
};
use clap::{ArgGroup, Parser};
use reqwest::Url;
#[cfg(feature = "metrics")]
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Provision an election with candidates and voters, then have every voter vote at once.
///
/// Exits with a non-zero status if the vote failure rate reaches the threshold.
#[derive(Parser, Debug)]
#[command(version, about)]
#[command(group(ArgGroup::new("admin").required(true).args(["admin_token", "admin_username"])))]
pub struct Cli {
    /// Election API base URL.
    #[arg(
        long,
        env = "BALLOT_BURST_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        value_parser = parse_base_url
    )]
    pub base_url: Url,

    /// Pre-issued admin token, sent verbatim as the Authorization header.
    #[arg(long, env = "BALLOT_BURST_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Admin username, exchanged for a token together with `--admin-password`.
    #[arg(long, env = "BALLOT_BURST_ADMIN_USERNAME", requires = "admin_password")]
    pub admin_username: Option<String>,

    #[arg(
        long,
        env = "BALLOT_BURST_ADMIN_PASSWORD",
        hide_env_values = true,
        requires = "admin_username"
    )]
    pub admin_password: Option<String>,

    #[arg(long, default_value = DEFAULT_ELECTION_NAME)]
    pub election_name: String,

    /// Election start, `YYYY-MM-DD HH:MM:SS`.
    #[arg(long, default_value = DEFAULT_ELECTION_START)]
    pub start_date: String,

    /// Election end, `YYYY-MM-DD HH:MM:SS`.
    #[arg(long, default_value = DEFAULT_ELECTION_END)]
    pub end_date: String,

    #[arg(short, long, default_value_t = ballot_burst_core::DEFAULT_CANDIDATE_COUNT)]
    pub candidates: usize,

    #[arg(short = 'n', long, default_value_t = ballot_burst_core::DEFAULT_TOTAL_VOTERS)]
    pub voters: usize,

    /// Concurrent workers; defaults to one per voter.
    #[arg(short = 'u', long)]
    pub virtual_users: Option<usize>,

    /// Maximum vote failure rate (exclusive).
    #[arg(short, long, default_value_t = ballot_burst_core::DEFAULT_FAILURE_THRESHOLD)]
    pub threshold: f64,

    /// In-flight requests per provisioning batch.
    #[arg(long, default_value_t = ballot_burst_core::DEFAULT_BATCH_PARALLELISM)]
    pub batch: NonZeroUsize,

    /// Per-request timeout, e.g. `30s` or `1m 30s`.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Keep going if some candidates cannot be created.
    #[arg(long)]
    pub allow_partial_candidates: bool,

    /// Serve Prometheus metrics on this address while the test runs.
    #[cfg(feature = "metrics")]
    #[arg(long, env = "BALLOT_BURST_PROMETHEUS")]
    pub prometheus: Option<SocketAddr>,
}

impl Cli {
    pub fn admin(&self) -> Result<AdminAuth, ConfigError> {
        match (&self.admin_token, &self.admin_username, &self.admin_password) {
            (Some(token), _, _) => Ok(AdminAuth::Token(token.clone())),
            (None, Some(username), Some(password)) => Ok(AdminAuth::Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(ConfigError::MissingAdminAuth),
        }
    }

    pub fn into_config(self) -> Result<LoadTestConfig, ConfigError> {
        let admin = self.admin()?;
        let mut config = LoadTestConfig::new(self.base_url, admin);
        config.election_name = self.election_name;
        config.election_window = ElectionWindow::parse(&self.start_date, &self.end_date)?;
        config.candidate_count = self.candidates;
        config.total_voters = self.voters;
        config.virtual_users = self.virtual_users;
        config.failure_threshold = self.threshold;
        config.batch_parallelism = self.batch;
        config.request_timeout = self.timeout;
        config.allow_partial_candidates = self.allow_partial_candidates;
        config.validate()?;
        Ok(config)
    }
}
