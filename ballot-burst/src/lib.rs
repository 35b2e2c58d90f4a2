#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod cli;
pub mod scenario;
#[doc(hidden)]
pub mod transaction;

pub(crate) mod batch;
pub mod client;
pub mod error;
pub(crate) mod measurement;
pub mod provision;
pub mod threshold;
pub mod workload;

pub use error::{LoadTestError, SetupError};
pub use scenario::{run_workers, ConfigurableLoadTest, LoadTest};

pub mod prelude {
    pub use crate::scenario::{ConfigurableLoadTest, LoadTest};
    pub use crate::error::LoadTestError;

    pub use ballot_burst_core::{
        parse_base_url, AdminAuth, ElectionWindow, LoadTestConfig, OutcomeSummary, RunStatistics,
        VoteOutcome,
    };
}
