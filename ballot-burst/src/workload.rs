use crate::client::{ApiClient, ApiRequest};
use ballot_burst_core::{ExecutionContext, LoadTestConfig, VoteOutcome, VoteRecord, VOTE_PATH};
use reqwest::Url;
use serde_json::json;
use std::time::Instant;
#[allow(unused)]
use tracing::{debug, error, trace, warn};

/// The single iteration each virtual user performs: cast one vote and classify the response.
pub struct VoteWorkload {
    client: ApiClient,
    vote_url: Url,
}

impl VoteWorkload {
    pub fn new(client: ApiClient, config: &LoadTestConfig) -> Self {
        Self {
            client,
            vote_url: config.endpoint(VOTE_PATH),
        }
    }

    /// Vote as voter `worker_index mod voters` for candidate `worker_index mod candidates`.
    ///
    /// Never retries. A voter without a token still votes, unauthenticated, so the server's
    /// answer decides the outcome. A candidate that was never created fails the worker without
    /// sending anything.
    pub async fn run(&self, ctx: &ExecutionContext, worker_index: usize) -> VoteRecord {
        let Some(assignment) = ctx.assign(worker_index) else {
            error!("Worker {worker_index} has no fixture to vote with");
            return VoteRecord::unsent(worker_index, None);
        };
        let Some(candidate_id) = ctx.candidate(&assignment) else {
            debug!(
                "Worker {worker_index} assigned missing candidate {}",
                assignment.candidate_index
            );
            return VoteRecord::unsent(worker_index, Some(assignment));
        };

        let request = ApiRequest::post(
            self.vote_url.clone(),
            json!({ "candidateID": candidate_id, "electionID": ctx.election_id() }),
        )
        .voter(ctx.token(&assignment));

        let start = Instant::now();
        let res = self.client.send(request).await;
        let latency = start.elapsed();

        match res {
            Ok(res) => {
                let outcome = VoteOutcome::from_status(res.status.as_u16());
                if outcome.is_failure() {
                    debug!("Worker {worker_index} vote failed with {}: {}", res.status, res.body);
                } else {
                    trace!("Worker {worker_index} vote {outcome}");
                }
                VoteRecord {
                    worker_index,
                    assignment: Some(assignment),
                    outcome,
                    status: Some(res.status.as_u16()),
                    latency: Some(latency),
                }
            }
            Err(err) => {
                warn!("Worker {worker_index} vote request failed: {err}");
                VoteRecord {
                    worker_index,
                    assignment: Some(assignment),
                    outcome: VoteOutcome::Failed,
                    status: None,
                    latency: Some(latency),
                }
            }
        }
    }
}
