use crate::client::{ApiClient, ApiRequest, ApiResponse};
use futures_util::stream::{self, StreamExt};
use std::num::NonZeroUsize;
#[allow(unused)]
use tracing::{debug, trace};

/// Issue `requests` concurrently, keeping at most `parallelism` in flight, and wait for all of
/// them.
///
/// Result `i` always belongs to request `i`, whatever order the responses arrive in. A transport
/// error only fails its own slot. Nothing is retried.
pub async fn execute_batch(
    client: &ApiClient,
    requests: Vec<ApiRequest>,
    parallelism: NonZeroUsize,
) -> Vec<Result<ApiResponse, reqwest::Error>> {
    let count = requests.len();
    debug!("Sending batch of {count} requests ({parallelism} in flight)");

    let results: Vec<_> = stream::iter(requests)
        .map(|request| client.send(request))
        .buffered(parallelism.get())
        .collect()
        .await;

    trace!(
        "Batch complete, {} transport errors",
        results.iter().filter(|r| r.is_err()).count()
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_burst_core::{parse_base_url, voter_id, AdminAuth, LoadTestConfig};
    use mock_service::{Faults, MockConfig};
    use serde_json::json;
    use std::time::Duration;

    async fn setup(faults: Faults) -> (mock_service::MockHandle, LoadTestConfig) {
        let mock = mock_service::spawn(MockConfig {
            faults,
            ..MockConfig::default()
        })
        .await
        .unwrap();
        let config = LoadTestConfig::new(
            parse_base_url(&mock.base_url()).unwrap(),
            AdminAuth::Token(mock.admin_token().to_string()),
        );
        (mock, config)
    }

    fn voter_requests(config: &LoadTestConfig, token: &str, count: usize) -> Vec<ApiRequest> {
        (0..count)
            .map(|i| {
                ApiRequest::post(config.endpoint("voter"), json!({ "userID": voter_id(i) }))
                    .authorization(token)
            })
            .collect()
    }

    fn login_requests(config: &LoadTestConfig, count: usize) -> Vec<ApiRequest> {
        (0..count)
            .map(|i| {
                let user = voter_id(i);
                ApiRequest::post(
                    config.endpoint("authenticate"),
                    json!({ "username": user, "password": user, "role": "user" }),
                )
            })
            .collect()
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread")]
    async fn responses_keep_request_order() {
        let faults = Faults::default().login_jitter(Duration::from_millis(40));
        let (mock, config) = setup(faults).await;
        let client = ApiClient::new(&config).unwrap();
        let parallelism = NonZeroUsize::new(64).unwrap();

        let created = execute_batch(
            &client,
            voter_requests(&config, mock.admin_token(), 200),
            parallelism,
        )
        .await;
        assert!(created.iter().all(|r| r.as_ref().unwrap().status.is_success()));

        let logins = execute_batch(&client, login_requests(&config, 200), parallelism).await;
        assert_eq!(logins.len(), 200);
        for (i, res) in logins.iter().enumerate() {
            let token: String = res.as_ref().unwrap().json().unwrap();
            assert!(
                token.starts_with(&format!("{}:", voter_id(i))),
                "slot {i} holds {token}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failures_stay_in_their_slot() {
        let (mock, config) = setup(Faults::default().reject_voter("user3")).await;
        let client = ApiClient::new(&config).unwrap();

        let mut requests = voter_requests(&config, mock.admin_token(), 6);
        // Nothing listens on the discard port, so this slot fails at the transport level.
        requests[1].url = "http://127.0.0.1:9/api/v1/voter".parse().unwrap();

        let results = execute_batch(&client, requests, NonZeroUsize::new(2).unwrap()).await;
        assert_eq!(results.len(), 6);
        assert!(results[1].is_err());
        assert_eq!(results[3].as_ref().unwrap().status.as_u16(), 400);
        for i in [0, 2, 4, 5] {
            assert_eq!(results[i].as_ref().unwrap().status.as_u16(), 201);
        }
    }

    #[tokio::test]
    async fn empty_batch() {
        let (_mock, config) = setup(Faults::default()).await;
        let client = ApiClient::new(&config).unwrap();
        let results = execute_batch(&client, vec![], NonZeroUsize::new(1).unwrap()).await;
        assert!(results.is_empty());
    }
}
