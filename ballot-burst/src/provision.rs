//! Fixture provisioning: everything that happens before the first vote.
use crate::client::{ApiClient, ApiRequest, ApiResponse};
use crate::error::SetupError;
use ballot_burst_core::{
    candidate_id, candidate_name, voter_id, AdminAuth, ExecutionContext, LoadTestConfig,
    ProvisionReport, VoterToken, ADMIN_ROLE, AUTHENTICATE_PATH, CANDIDATE_PATH, ELECTION_PATH,
    VOTER_PATH, VOTER_ROLE,
};
use serde_json::json;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

pub struct Provisioner<'a> {
    client: &'a ApiClient,
    config: &'a LoadTestConfig,
}

impl<'a> Provisioner<'a> {
    pub fn new(client: &'a ApiClient, config: &'a LoadTestConfig) -> Self {
        Self { client, config }
    }

    /// Create the election, candidates and voters, then log every voter in.
    ///
    /// Voter creation and login failures only blank out their own slot; everything else that
    /// goes wrong aborts the run.
    #[instrument(name = "provision", skip_all, fields(election = %self.config.election_name))]
    pub async fn provision(&self) -> Result<(ExecutionContext, ProvisionReport), SetupError> {
        let mut report = ProvisionReport::default();

        let admin_token = self.admin_token().await?;
        let election_id = self.create_election(&admin_token).await?;
        info!("Created election {election_id}");

        let candidate_ids = self
            .create_candidates(&admin_token, &election_id, &mut report)
            .await?;
        self.create_voters(&admin_token, &mut report).await;
        let voter_tokens = self.login_voters(&mut report).await;

        info!(
            "Provisioned {} candidates, {}/{} voters, {}/{} logins",
            report.candidates_created,
            report.voters_created,
            self.config.total_voters,
            report.logins,
            self.config.total_voters,
        );

        Ok((
            ExecutionContext::new(election_id, candidate_ids, voter_tokens),
            report,
        ))
    }

    async fn admin_token(&self) -> Result<String, SetupError> {
        let (username, password) = match &self.config.admin {
            AdminAuth::Token(token) => return Ok(token.clone()),
            AdminAuth::Credentials { username, password } => (username, password),
        };

        debug!("Logging in as admin {username}");
        let res = self
            .send(
                AUTHENTICATE_PATH,
                ApiRequest::post(
                    self.config.endpoint(AUTHENTICATE_PATH),
                    json!({ "username": username, "password": password, "role": ADMIN_ROLE }),
                ),
            )
            .await?;

        if !res.status.is_success() {
            return Err(SetupError::AdminLoginRejected {
                status: res.status.as_u16(),
                body: res.body,
            });
        }

        res.json().map_err(|source| SetupError::Decode {
            what: "admin token",
            source,
        })
    }

    async fn create_election(&self, admin_token: &str) -> Result<String, SetupError> {
        let window = &self.config.election_window;
        let request = ApiRequest::post(
            self.config.endpoint(ELECTION_PATH),
            json!({
                "electionName": self.config.election_name,
                "startDate": window.start_text(),
                "endDate": window.end_text(),
            }),
        )
        .authorization(admin_token);

        let res = self.send(ELECTION_PATH, request).await?;
        if res.status.as_u16() != 201 {
            error!("Election creation failed with {}: {}", res.status, res.body);
            return Err(SetupError::ElectionRejected {
                status: res.status.as_u16(),
                body: res.body,
            });
        }

        res.json().map_err(|source| SetupError::Decode {
            what: "election ID",
            source,
        })
    }

    async fn create_candidates(
        &self,
        admin_token: &str,
        election_id: &str,
        report: &mut ProvisionReport,
    ) -> Result<Vec<Option<String>>, SetupError> {
        let total = self.config.candidate_count;
        let requests = (0..total)
            .map(|i| {
                ApiRequest::post(
                    self.config.endpoint(CANDIDATE_PATH),
                    json!({
                        "name": candidate_name(i),
                        "userID": voter_id(i),
                        "electionID": election_id,
                    }),
                )
                .authorization(admin_token)
            })
            .collect();

        let candidate_ids: Vec<_> = self
            .client
            .batch(requests)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, res)| match res {
                Ok(res) if res.status.is_success() => Some(candidate_id(i)),
                Ok(res) => {
                    warn!("Candidate {i} rejected with {}: {}", res.status, res.body);
                    None
                }
                Err(err) => {
                    warn!("Candidate {i} request failed: {err}");
                    None
                }
            })
            .collect();

        report.candidates_created = candidate_ids.iter().flatten().count();
        report.candidate_failures = total - report.candidates_created;

        let partial_allowed =
            self.config.allow_partial_candidates && report.candidates_created > 0;
        if report.candidate_failures > 0 && !partial_allowed {
            return Err(SetupError::CandidatesRejected {
                failed: report.candidate_failures,
                total,
            });
        }

        Ok(candidate_ids)
    }

    async fn create_voters(&self, admin_token: &str, report: &mut ProvisionReport) {
        let requests = (0..self.config.total_voters)
            .map(|i| {
                ApiRequest::post(
                    self.config.endpoint(VOTER_PATH),
                    json!({ "userID": voter_id(i) }),
                )
                .authorization(admin_token)
            })
            .collect();

        for (i, res) in self.client.batch(requests).await.into_iter().enumerate() {
            match res {
                Ok(res) if res.status.is_success() => report.voters_created += 1,
                Ok(res) => {
                    // The account may already exist from an earlier run; its login decides.
                    debug!("Voter {i} rejected with {}: {}", res.status, res.body);
                    report.voter_failures += 1;
                }
                Err(err) => {
                    warn!("Voter {i} request failed: {err}");
                    report.voter_failures += 1;
                }
            }
        }

        if report.voter_failures > 0 {
            warn!(
                "{} of {} voters could not be created",
                report.voter_failures, self.config.total_voters
            );
        }
    }

    async fn login_voters(&self, report: &mut ProvisionReport) -> Vec<Option<VoterToken>> {
        let requests = (0..self.config.total_voters)
            .map(|i| {
                let user = voter_id(i);
                ApiRequest::post(
                    self.config.endpoint(AUTHENTICATE_PATH),
                    json!({ "username": user, "password": user, "role": VOTER_ROLE }),
                )
            })
            .collect();

        let tokens: Vec<_> = self
            .client
            .batch(requests)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, res)| decode_token(i, res))
            .collect();

        report.logins = tokens.iter().flatten().count();
        report.login_failures = tokens.len() - report.logins;
        if report.login_failures > 0 {
            warn!(
                "{} of {} voters could not log in; their workers will be unauthorized",
                report.login_failures,
                tokens.len()
            );
        }

        tokens
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: ApiRequest,
    ) -> Result<ApiResponse, SetupError> {
        self.client
            .send(request)
            .await
            .map_err(|source| SetupError::Transport { endpoint, source })
    }
}

fn decode_token(index: usize, res: Result<ApiResponse, reqwest::Error>) -> Option<VoterToken> {
    let res = match res {
        Ok(res) if res.status.is_success() => res,
        Ok(res) => {
            debug!("Login {index} rejected with {}: {}", res.status, res.body);
            return None;
        }
        Err(err) => {
            warn!("Login {index} request failed: {err}");
            return None;
        }
    };

    match res.json::<String>() {
        Ok(token) => Some(VoterToken::new(token)),
        Err(err) => {
            warn!("Login {index} returned an undecodable token: {err}");
            None
        }
    }
}
