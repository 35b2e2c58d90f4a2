mod utils;
#[allow(unused)]
use utils::*;

use ballot_burst::prelude::*;
use ballot_burst::{LoadTestError, SetupError};
use ballot_burst_core::ConfigError;
use mock_service::Faults;

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn full_run_passes() {
    let (mock, config) = mock_with(Faults::default()).await;

    let stats = LoadTest::new(config).voters(200).candidates(5).await.unwrap();

    assert!(stats.passed);
    assert_eq!(stats.virtual_users, 200);
    assert_eq!(stats.summary.accepted, 200);
    assert_eq!(stats.summary.total(), 200);
    assert_eq!(stats.failure_rate, 0.0);
    assert_eq!(stats.provision.candidates_created, 5);
    assert_eq!(stats.provision.voters_created, 200);
    assert_eq!(stats.provision.logins, 200);
    assert_eq!(stats.records.len(), 200);

    assert_eq!(mock.state.elections_created(), 1);
    assert_eq!(mock.state.vote_requests(), 200);
    assert_eq!(mock.state.accepted_ballots("election.1"), 200);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn admin_credentials_login() {
    let (mock, mut config) = mock_with(Faults::default()).await;
    config.admin = AdminAuth::Credentials {
        username: "admin".to_string(),
        password: "admin".to_string(),
    };

    let stats = LoadTest::new(config).voters(20).candidates(2).await.unwrap();

    assert!(stats.passed);
    assert_eq!(stats.summary.accepted, 20);
    assert_eq!(mock.state.elections_created(), 1);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn rejected_admin_token_sends_no_votes() {
    let (mock, mut config) = mock_with(Faults::default()).await;
    config.admin = AdminAuth::Token("expired".to_string());

    let err = LoadTest::new(config).voters(20).await.unwrap_err();

    assert!(
        matches!(
            err,
            LoadTestError::Setup(SetupError::ElectionRejected { status: 401, .. })
        ),
        "unexpected error: {err}"
    );
    assert_eq!(mock.state.elections_created(), 0);
    assert_eq!(mock.state.vote_requests(), 0);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn invalid_config_never_reaches_server() {
    let (mock, config) = mock_with(Faults::default()).await;

    let err = LoadTest::new(config).candidates(0).await.unwrap_err();

    assert!(matches!(err, LoadTestError::Config(ConfigError::NoCandidates)));
    assert_eq!(mock.state.elections_created(), 0);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn rejected_candidate_aborts_by_default() {
    let (mock, config) = mock_with(Faults::default().reject_candidate("user3")).await;

    let err = LoadTest::new(config).voters(20).await.unwrap_err();

    assert!(matches!(
        err,
        LoadTestError::Setup(SetupError::CandidatesRejected { failed: 1, total: 5 })
    ));
    assert_eq!(mock.state.vote_requests(), 0);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn partial_candidates_fail_their_workers() {
    let (mock, config) = mock_with(Faults::default().reject_candidate("user3")).await;

    let stats = LoadTest::new(config)
        .voters(100)
        .candidates(5)
        .allow_partial_candidates()
        .await
        .unwrap();

    // Every fifth worker is assigned the missing candidate and sends nothing.
    assert_eq!(stats.provision.candidate_failures, 1);
    assert_eq!(stats.summary.failed, 20);
    assert_eq!(stats.summary.accepted, 80);
    assert_eq!(mock.state.vote_requests(), 80);
    assert!(!stats.passed);
}
