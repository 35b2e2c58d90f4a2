mod utils;
#[allow(unused)]
use utils::*;

use ballot_burst::prelude::*;
use mock_service::Faults;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn unauthorized_votes_do_not_fail_the_run() {
    let faults = user_ids(0..10).fold(Faults::default(), |f, id| f.reject_login(&id));
    let (mock, config) = mock_with(faults).await;

    let stats = LoadTest::new(config).voters(100).await.unwrap();

    assert_eq!(stats.provision.login_failures, 10);
    assert_eq!(stats.summary.unauthorized, 10);
    assert_eq!(stats.summary.accepted, 90);
    assert_eq!(stats.summary.failed, 0);
    assert!(stats.passed);
    // Voters without a token still vote.
    assert_eq!(mock.state.vote_requests(), 100);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn double_votes_do_not_fail_the_run() {
    let (mock, config) = mock_with(Faults::default()).await;

    let stats = LoadTest::new(config)
        .voters(50)
        .virtual_users(150)
        .await
        .unwrap();

    assert_eq!(stats.virtual_users, 150);
    assert_eq!(stats.summary.accepted, 50);
    assert_eq!(stats.summary.already_voted, 100);
    assert_eq!(stats.failure_rate, 0.0);
    assert!(stats.passed);
    assert_eq!(mock.state.accepted_ballots("election.1"), 50);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn server_errors_below_threshold_pass() {
    let faults = user_ids(0..4).fold(Faults::default(), |f, id| f.vote_status(&id, 503));
    let (_mock, config) = mock_with(faults).await;

    let stats = LoadTest::new(config).voters(100).await.unwrap();

    assert_eq!(stats.summary.failed, 4);
    assert_eq!(stats.failure_rate, 0.04);
    assert!(stats.passed);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn server_errors_at_threshold_fail() {
    let faults = user_ids(0..5).fold(Faults::default(), |f, id| f.vote_status(&id, 500));
    let (_mock, config) = mock_with(faults).await;

    let stats = LoadTest::new(config).voters(100).await.unwrap();

    assert_eq!(stats.summary.failed, 5);
    assert_eq!(stats.failure_rate, 0.05);
    assert!(!stats.passed);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn custom_threshold() {
    let faults = user_ids(0..5).fold(Faults::default(), |f, id| f.vote_status(&id, 500));
    let (_mock, config) = mock_with(faults).await;

    let stats = LoadTest::new(config)
        .voters(100)
        .failure_threshold(0.1)
        .await
        .unwrap();

    assert!(stats.passed);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn timed_out_votes_fail_the_run() {
    let (mock, config) = mock_with(Faults::default().vote_delay(Duration::from_secs(2))).await;

    let stats = LoadTest::new(config)
        .voters(20)
        .request_timeout(Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(stats.summary.failed, 20);
    assert!(stats.records.iter().all(|r| r.status.is_none()));
    assert_eq!(stats.failure_rate, 1.0);
    assert!(!stats.passed);
    assert_eq!(mock.state.vote_requests(), 20);
}

#[cfg(feature = "integration")]
mod reference {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn two_thousand_voters_five_candidates() {
        let (mock, config) = mock_with(Faults::default()).await;

        let stats = LoadTest::new(config).voters(2000).candidates(5).await.unwrap();

        assert!(stats.passed);
        assert_eq!(stats.summary.accepted, 2000);
        assert_eq!(mock.state.accepted_ballots("election.1"), 2000);
    }
}
