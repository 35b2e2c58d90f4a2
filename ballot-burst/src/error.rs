use ballot_burst_core::ConfigError;
use thiserror::Error;

/// Errors that abort provisioning before any vote traffic is generated.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Admin login rejected with status {status}: {body}")]
    AdminLoginRejected { status: u16, body: String },

    #[error("Election creation rejected with status {status}: {body}")]
    ElectionRejected { status: u16, body: String },

    #[error("{failed} of {total} candidates could not be created")]
    CandidatesRejected { failed: usize, total: usize },

    #[error("Unable to decode {what} from response body: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),
}
