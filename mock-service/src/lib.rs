//! In-process election API used to exercise the load harness.
//!
//! Serves the same `/api/v1` surface as the real election service: admin-only creation of
//! elections, candidates and voters, password login for admins and voters, and vote casting with
//! a one-ballot-per-voter-per-election ledger. Faults can be injected per identifier.
use axum::{
    debug_handler,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub const API_PREFIX: &str = "/api/v1";

type Reply = (StatusCode, Json<Value>);

/// Behaviour knobs for the mock service.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub admin_username: String,
    pub admin_password: String,
    /// A pre-issued admin token, accepted without logging in.
    pub admin_token: String,
    pub faults: Faults,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            admin_token: "mock-admin-token".to_string(),
            faults: Faults::default(),
        }
    }
}

/// Injected misbehaviour, keyed by voter user ID.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub reject_candidates: HashSet<String>,
    pub reject_voters: HashSet<String>,
    pub reject_logins: HashSet<String>,
    pub vote_status: HashMap<String, u16>,
    pub vote_delay: Option<Duration>,
    /// Upper bound of a deterministic per-voter delay applied to logins.
    pub login_jitter: Option<Duration>,
}

impl Faults {
    pub fn reject_candidate(mut self, user_id: &str) -> Self {
        self.reject_candidates.insert(user_id.to_string());
        self
    }

    pub fn reject_voter(mut self, user_id: &str) -> Self {
        self.reject_voters.insert(user_id.to_string());
        self
    }

    pub fn reject_login(mut self, user_id: &str) -> Self {
        self.reject_logins.insert(user_id.to_string());
        self
    }

    pub fn vote_status(mut self, user_id: &str, status: u16) -> Self {
        self.vote_status.insert(user_id.to_string(), status);
        self
    }

    pub fn vote_delay(mut self, delay: Duration) -> Self {
        self.vote_delay = Some(delay);
        self
    }

    pub fn login_jitter(mut self, max: Duration) -> Self {
        self.login_jitter = Some(max);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Role {
    Admin,
    User,
}

#[derive(Clone, Debug)]
struct Session {
    user_id: String,
    role: Role,
}

#[derive(Default)]
struct Ledger {
    elections: HashMap<String, HashSet<String>>,
    voters: HashSet<String>,
    sessions: HashMap<String, Session>,
    ballots: HashSet<(String, String)>,
    next_election: u64,
    next_token: u64,
}

#[derive(Default)]
struct Counters {
    elections_created: AtomicU64,
    vote_requests: AtomicU64,
    votes_in_flight: AtomicUsize,
    peak_votes_in_flight: AtomicUsize,
}

pub struct MockState {
    config: MockConfig,
    ledger: Mutex<Ledger>,
    counters: Counters,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            ledger: Mutex::new(Ledger::default()),
            counters: Counters::default(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn elections_created(&self) -> u64 {
        self.counters.elections_created.load(Ordering::Relaxed)
    }

    pub fn vote_requests(&self) -> u64 {
        self.counters.vote_requests.load(Ordering::Relaxed)
    }

    /// Largest number of vote requests observed inside the handler at the same time.
    pub fn peak_votes_in_flight(&self) -> usize {
        self.counters.peak_votes_in_flight.load(Ordering::Relaxed)
    }

    pub fn accepted_ballots(&self, election_id: &str) -> usize {
        self.ledger()
            .ballots
            .iter()
            .filter(|(_, election)| election == election_id)
            .count()
    }

    pub fn has_voted(&self, user_id: &str, election_id: &str) -> bool {
        self.ledger()
            .ballots
            .contains(&(user_id.to_string(), election_id.to_string()))
    }

    fn authorize(&self, headers: &HeaderMap, roles: &[Role]) -> Result<Session, Reply> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().trim_matches('"'))
            .unwrap_or_default();

        if token.is_empty() {
            return Err(reply(StatusCode::UNAUTHORIZED, "Missing token"));
        }

        let session = if token == self.config.admin_token {
            Session {
                user_id: self.config.admin_username.clone(),
                role: Role::Admin,
            }
        } else {
            self.ledger()
                .sessions
                .get(token)
                .cloned()
                .ok_or_else(|| reply(StatusCode::UNAUTHORIZED, "Invalid token"))?
        };

        if roles.contains(&session.role) {
            Ok(session)
        } else {
            Err(reply(
                StatusCode::UNAUTHORIZED,
                "user does not have the access",
            ))
        }
    }

    fn issue_token(&self, user_id: &str, role: Role) -> String {
        let mut ledger = self.ledger();
        ledger.next_token += 1;
        let token = format!("{user_id}:{}", ledger.next_token);
        ledger.sessions.insert(
            token.clone(),
            Session {
                user_id: user_id.to_string(),
                role,
            },
        );
        token
    }
}

pub fn router(state: Arc<MockState>) -> Router {
    let api = Router::new()
        .route("/election", post(create_election))
        .route("/candidate", post(create_candidate))
        .route("/voter", post(create_voter))
        .route("/authenticate", post(authenticate))
        .route("/vote", post(cast_vote));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: SocketAddr, config: MockConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    let state = Arc::new(MockState::new(config));
    axum::serve(listener, router(state)).await
}

/// A mock service running on an ephemeral local port.
pub struct MockHandle {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn admin_token(&self) -> &str {
        &self.state.config.admin_token
    }
}

pub async fn spawn(config: MockConfig) -> std::io::Result<MockHandle> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(MockState::new(config));
    let app = router(state.clone());

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    Ok(MockHandle { addr, state })
}

/** Handlers **/

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewElection {
    election_name: String,
    start_date: String,
    end_date: String,
}

#[debug_handler]
async fn create_election(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(election): Json<NewElection>,
) -> Reply {
    if let Err(rejection) = state.authorize(&headers, &[Role::Admin]) {
        return rejection;
    }

    let election_id = {
        let mut ledger = state.ledger();
        ledger.next_election += 1;
        let election_id = format!("election.{}", ledger.next_election);
        ledger
            .elections
            .insert(election_id.clone(), HashSet::new());
        election_id
    };
    state
        .counters
        .elections_created
        .fetch_add(1, Ordering::Relaxed);

    debug!(
        "Created {election_id} ({}, {} - {})",
        election.election_name, election.start_date, election.end_date
    );
    (StatusCode::CREATED, Json(json!(election_id)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewCandidate {
    name: String,
    #[serde(rename = "userID")]
    user_id: String,
    #[serde(rename = "electionID")]
    election_id: String,
}

async fn create_candidate(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(candidate): Json<NewCandidate>,
) -> Reply {
    if let Err(rejection) = state.authorize(&headers, &[Role::Admin]) {
        return rejection;
    }
    if state.config.faults.reject_candidates.contains(&candidate.user_id) {
        return reply(StatusCode::BAD_REQUEST, "candidate rejected");
    }

    let mut ledger = state.ledger();
    let Some(candidates) = ledger.elections.get_mut(&candidate.election_id) else {
        return reply(StatusCode::BAD_REQUEST, "election does not exist");
    };
    candidates.insert(format!("candidate.{}", candidate.user_id));

    debug!("Created candidate {} for {}", candidate.name, candidate.election_id);
    reply(
        StatusCode::CREATED,
        "Candidate created. Txn committed successfully.",
    )
}

#[derive(Deserialize)]
struct NewVoter {
    #[serde(rename = "userID")]
    user_id: String,
}

async fn create_voter(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(voter): Json<NewVoter>,
) -> Reply {
    if let Err(rejection) = state.authorize(&headers, &[Role::Admin]) {
        return rejection;
    }
    if state.config.faults.reject_voters.contains(&voter.user_id) {
        return reply(StatusCode::BAD_REQUEST, "voter rejected");
    }
    if !state.ledger().voters.insert(voter.user_id) {
        return reply(StatusCode::BAD_REQUEST, "voter already exists");
    }

    reply(
        StatusCode::CREATED,
        "Voter created. Txn committed successfully.",
    )
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
    role: String,
}

async fn authenticate(
    State(state): State<Arc<MockState>>,
    Json(creds): Json<Credentials>,
) -> Reply {
    let role = match creds.role.as_str() {
        "admin" => Role::Admin,
        "user" => Role::User,
        _ => return reply(StatusCode::UNAUTHORIZED, "Invalid role"),
    };

    if let Some(max) = state.config.faults.login_jitter {
        tokio::time::sleep(jitter(&creds.username, max)).await;
    }

    let valid = match role {
        Role::Admin => {
            creds.username == state.config.admin_username
                && creds.password == state.config.admin_password
        }
        Role::User => {
            creds.username == creds.password
                && !state.config.faults.reject_logins.contains(&creds.username)
                && state.ledger().voters.contains(&creds.username)
        }
    };
    if !valid {
        return reply(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let token = state.issue_token(&creds.username, role);
    (StatusCode::OK, Json(json!(token)))
}

#[derive(Deserialize)]
struct Ballot {
    #[serde(rename = "candidateID")]
    candidate_id: String,
    #[serde(rename = "electionID")]
    election_id: String,
}

async fn cast_vote(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(ballot): Json<Ballot>,
) -> Reply {
    counter!("mock-service.votes").increment(1);
    state.counters.vote_requests.fetch_add(1, Ordering::Relaxed);
    let in_flight = state.counters.votes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state
        .counters
        .peak_votes_in_flight
        .fetch_max(in_flight, Ordering::SeqCst);

    if let Some(delay) = state.config.faults.vote_delay {
        tokio::time::sleep(delay).await;
    }
    let res = record_ballot(&state, &headers, ballot);

    state.counters.votes_in_flight.fetch_sub(1, Ordering::SeqCst);
    res
}

fn record_ballot(state: &MockState, headers: &HeaderMap, ballot: Ballot) -> Reply {
    let session = match state.authorize(headers, &[Role::User, Role::Admin]) {
        Ok(session) => session,
        Err(rejection) => return rejection,
    };

    if let Some(status) = state.config.faults.vote_status.get(&session.user_id) {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return reply(status, "injected fault");
    }

    let mut ledger = state.ledger();
    match ledger.elections.get(&ballot.election_id) {
        None => return reply(StatusCode::BAD_REQUEST, "election does not exist"),
        Some(candidates) if !candidates.contains(&ballot.candidate_id) => {
            return reply(StatusCode::BAD_REQUEST, "candidate does not exist")
        }
        Some(_) => {}
    }

    if !ledger
        .ballots
        .insert((session.user_id.clone(), ballot.election_id))
    {
        debug!("{} already voted", session.user_id);
        return reply(StatusCode::CONFLICT, "voter already voted");
    }

    reply(
        StatusCode::OK,
        "Vote casted. Txn committed successfully.",
    )
}

/** Utils **/

fn reply(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({ "message": message, "status": status.as_u16() })),
    )
}

/// Deterministic delay in `[0, max)` derived from the username, so that a batch of logins
/// completes out of submission order.
fn jitter(username: &str, max: Duration) -> Duration {
    let seed = username
        .bytes()
        .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    max.mul_f64((seed % 97) as f64 / 97.)
}
