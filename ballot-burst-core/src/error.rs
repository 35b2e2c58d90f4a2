use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Either an admin token or admin username and password is required")]
    MissingAdminAuth,

    #[error("At least one candidate is required")]
    NoCandidates,

    #[error("At least one voter is required")]
    NoVoters,

    #[error("At least one virtual user is required")]
    NoVirtualUsers,

    #[error("Failure threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Invalid election date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },

    #[error("Unable to format election date: {0}")]
    DateFormat(#[from] time::error::Format),

    #[error("Election must start before it ends ({start} >= {end})")]
    EmptyElectionWindow { start: String, end: String },

    #[error("Request timeout must be non-zero")]
    ZeroTimeout,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("Base URL {0} cannot carry API paths")]
    OpaqueBaseUrl(String),
}
