use crate::{
    ConfigError, DEFAULT_BATCH_PARALLELISM, DEFAULT_CANDIDATE_COUNT, DEFAULT_ELECTION_END,
    DEFAULT_ELECTION_NAME, DEFAULT_ELECTION_START, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOTAL_VOTERS,
};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;
use url::Url;

/// Date format understood by the election API, e.g. `2006-01-02 15:04:05`.
pub const ELECTION_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// How the harness authenticates its admin requests.
#[derive(Clone)]
pub enum AdminAuth {
    /// A token issued ahead of time, sent verbatim.
    Token(String),
    /// Admin credentials exchanged for a token through `/authenticate` during setup.
    Credentials { username: String, password: String },
}

impl fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAuth::Token(_) => f.write_str("Token(<redacted>)"),
            AdminAuth::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Validated start/end pair for the provisioned election.
#[derive(Clone, Debug)]
pub struct ElectionWindow {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
    start_text: String,
    end_text: String,
}

impl ElectionWindow {
    pub fn new(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Result<Self, ConfigError> {
        let start_text = start.format(ELECTION_DATE_FORMAT)?;
        let end_text = end.format(ELECTION_DATE_FORMAT)?;
        if start >= end {
            return Err(ConfigError::EmptyElectionWindow {
                start: start_text,
                end: end_text,
            });
        }

        Ok(Self {
            start,
            end,
            start_text,
            end_text,
        })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.end
    }

    pub fn start_text(&self) -> &str {
        &self.start_text
    }

    pub fn end_text(&self) -> &str {
        &self.end_text
    }
}

impl Default for ElectionWindow {
    fn default() -> Self {
        // The default dates are compile-time constants that are known to parse.
        match Self::parse(DEFAULT_ELECTION_START, DEFAULT_ELECTION_END) {
            Ok(window) => window,
            Err(err) => unreachable!("default election window is invalid: {err}"),
        }
    }
}

fn parse_date(value: &str) -> Result<PrimitiveDateTime, ConfigError> {
    PrimitiveDateTime::parse(value, ELECTION_DATE_FORMAT).map_err(|source| {
        ConfigError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Parse an API base URL such as `http://localhost/api/v1`.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::OpaqueBaseUrl(value.to_string()));
    }
    Ok(url)
}

#[derive(Clone, Debug)]
pub struct LoadTestConfig {
    pub base_url: Url,
    pub admin: AdminAuth,
    pub election_name: String,
    pub election_window: ElectionWindow,
    pub candidate_count: usize,
    pub total_voters: usize,
    /// Number of concurrent workers; `None` runs one worker per voter.
    pub virtual_users: Option<usize>,
    pub failure_threshold: f64,
    pub batch_parallelism: NonZeroUsize,
    pub request_timeout: Duration,
    /// Keep going when some (but not all) candidates fail to be created.
    pub allow_partial_candidates: bool,
}

impl LoadTestConfig {
    pub fn new(base_url: Url, admin: AdminAuth) -> Self {
        Self {
            base_url,
            admin,
            election_name: DEFAULT_ELECTION_NAME.to_string(),
            election_window: ElectionWindow::default(),
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            total_voters: DEFAULT_TOTAL_VOTERS,
            virtual_users: None,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            batch_parallelism: DEFAULT_BATCH_PARALLELISM,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            allow_partial_candidates: false,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.virtual_users.unwrap_or(self.total_voters)
    }

    /// Resolve an API path (e.g. `vote`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_count == 0 {
            return Err(ConfigError::NoCandidates);
        }
        if self.total_voters == 0 {
            return Err(ConfigError::NoVoters);
        }
        if self.worker_count() == 0 {
            return Err(ConfigError::NoVirtualUsers);
        }
        if !(self.failure_threshold > 0. && self.failure_threshold <= 1.) {
            return Err(ConfigError::InvalidThreshold(self.failure_threshold));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::OpaqueBaseUrl(self.base_url.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for LoadTestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url={}, election={:?}, candidates={}, voters={}, virtual_users={}, threshold={}, batch={}, timeout={}",
            self.base_url,
            self.election_name,
            self.candidate_count,
            self.total_voters,
            self.worker_count(),
            self.failure_threshold,
            self.batch_parallelism,
            humantime::format_duration(self.request_timeout),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoadTestConfig {
        LoadTestConfig::new(
            parse_base_url("http://localhost:80/api/v1").unwrap(),
            AdminAuth::Token("admin-token".to_string()),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = config();
        config.validate().unwrap();
        assert_eq!(config.candidate_count, 5);
        assert_eq!(config.total_voters, 2000);
        assert_eq!(config.worker_count(), 2000);
        assert_eq!(config.election_window.start_text(), "2006-01-02 15:04:05");
        assert_eq!(config.election_window.end_text(), "2026-05-02 15:04:05");
    }

    #[test]
    fn rejects_zero_candidates() {
        let mut config = config();
        config.candidate_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoCandidates)));
    }

    #[test]
    fn rejects_zero_voters_and_workers() {
        let mut config = config();
        config.total_voters = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoVoters)));

        let mut config = self::config();
        config.virtual_users = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::NoVirtualUsers)));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        for threshold in [0., -0.1, 1.5, f64::NAN] {
            let mut config = config();
            config.failure_threshold = threshold;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidThreshold(_))
            ));
        }
    }

    #[test]
    fn rejects_inverted_election_window() {
        let err = ElectionWindow::parse("2026-05-02 15:04:05", "2006-01-02 15:04:05").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyElectionWindow { .. }));

        let err = ElectionWindow::parse("yesterday", "2006-01-02 15:04:05").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDate { .. }));
    }

    #[test]
    fn window_keeps_parsed_dates() {
        let window = ElectionWindow::parse("2024-03-01 08:00:00", "2024-03-01 20:00:00").unwrap();
        assert_eq!(window.start(), time::macros::datetime!(2024-03-01 08:00:00));
        assert_eq!(window.end() - window.start(), time::Duration::hours(12));

        let rebuilt = ElectionWindow::new(window.start(), window.end()).unwrap();
        assert_eq!(rebuilt.start_text(), "2024-03-01 08:00:00");
        assert_eq!(rebuilt.end_text(), "2024-03-01 20:00:00");
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let config = config();
        assert_eq!(
            config.endpoint("vote").as_str(),
            "http://localhost/api/v1/vote"
        );

        let mut config = config;
        config.base_url = parse_base_url("http://127.0.0.1:3000/api/v1/").unwrap();
        assert_eq!(
            config.endpoint("authenticate").as_str(),
            "http://127.0.0.1:3000/api/v1/authenticate"
        );
    }

    #[test]
    fn rejects_opaque_base_url() {
        assert!(matches!(
            parse_base_url("mailto:admin@example.com"),
            Err(ConfigError::OpaqueBaseUrl(_))
        ));
    }

    #[test]
    fn admin_token_is_redacted() {
        let debug = format!("{:?}", AdminAuth::Token("secret".to_string()));
        assert!(!debug.contains("secret"));
    }
}
