//! Load test orchestration: provision, burst, judge.
use crate::client::ApiClient;
use crate::error::LoadTestError;
use crate::measurement::LatencyDigest;
use crate::provision::Provisioner;
use crate::threshold::ThresholdEvaluator;
use crate::transaction::OutcomeRecorder;
use crate::workload::VoteWorkload;
use ballot_burst_core::{
    ElectionWindow, ExecutionContext, LoadTestConfig, RunStatistics, VoteRecord,
};
use std::{
    future::Future,
    num::NonZeroUsize,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};
use tokio::sync::Barrier;
use tokio::task::JoinHandle;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

type RunnerFuture = Pin<Box<dyn Future<Output = Result<RunStatistics, LoadTestError>> + Send>>;

/// A configured load test. Nothing happens until it is awaited.
///
/// # Example
/// ```no_run
/// use ballot_burst::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let base_url = parse_base_url("http://localhost:80/api/v1")?;
///     let stats = LoadTest::new(LoadTestConfig::new(
///         base_url,
///         AdminAuth::Token("admin-jwt".to_string()),
///     ))
///     .voters(2000)
///     .candidates(5)
///     .await?;
///
///     assert!(stats.passed);
///     Ok(())
/// }
/// ```
#[pin_project::pin_project]
pub struct LoadTest {
    config: LoadTestConfig,
    runner_fut: Option<RunnerFuture>,
}

impl LoadTest {
    pub fn new(config: LoadTestConfig) -> Self {
        Self {
            config,
            runner_fut: None,
        }
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }
}

impl Future for LoadTest {
    type Output = Result<RunStatistics, LoadTestError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let config = this.config;
        let runner = this
            .runner_fut
            .get_or_insert_with(|| Box::pin(run_load_test(config.clone())));
        runner.as_mut().poll(cx)
    }
}

/// Builder methods for a [`LoadTest`]. They only take effect before the test is first polled.
pub trait ConfigurableLoadTest: Future + Sized + Send {
    fn voters(self, total_voters: usize) -> Self;
    fn candidates(self, candidate_count: usize) -> Self;
    fn virtual_users(self, virtual_users: usize) -> Self;
    fn failure_threshold(self, threshold: f64) -> Self;
    fn election(self, name: &str, window: ElectionWindow) -> Self;
    fn batch_parallelism(self, parallelism: NonZeroUsize) -> Self;
    fn request_timeout(self, timeout: Duration) -> Self;
    fn allow_partial_candidates(self) -> Self;
}

impl ConfigurableLoadTest for LoadTest {
    /// Number of voter accounts to create and log in.
    fn voters(mut self, total_voters: usize) -> Self {
        self.config.total_voters = total_voters;
        self
    }

    fn candidates(mut self, candidate_count: usize) -> Self {
        self.config.candidate_count = candidate_count;
        self
    }

    /// Run a different number of workers than there are voters. Workers beyond the voter count
    /// wrap around and reuse tokens, which exercises the double-vote path.
    fn virtual_users(mut self, virtual_users: usize) -> Self {
        self.config.virtual_users = Some(virtual_users);
        self
    }

    /// Maximum failure rate, exclusive. The default is 5%.
    fn failure_threshold(mut self, threshold: f64) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    fn election(mut self, name: &str, window: ElectionWindow) -> Self {
        self.config.election_name = name.to_string();
        self.config.election_window = window;
        self
    }

    fn batch_parallelism(mut self, parallelism: NonZeroUsize) -> Self {
        self.config.batch_parallelism = parallelism;
        self
    }

    fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    fn allow_partial_candidates(mut self) -> Self {
        self.config.allow_partial_candidates = true;
        self
    }
}

#[instrument(name = "load_test", skip_all, fields(election = %config.election_name))]
pub(crate) async fn run_load_test(
    config: LoadTestConfig,
) -> Result<RunStatistics, LoadTestError> {
    config.validate()?;
    info!("Running load test with {config}");

    let client = ApiClient::new(&config)?;

    let setup_start = Instant::now();
    let (ctx, provision) = Provisioner::new(&client, &config).provision().await?;
    let setup_elapsed = setup_start.elapsed();

    let virtual_users = config.worker_count();
    let recorder = OutcomeRecorder::new();
    let workload = VoteWorkload::new(client, &config);

    let run_start = Instant::now();
    let records = run_workers(workload, Arc::new(ctx), virtual_users, &recorder).await;
    let run_elapsed = run_start.elapsed();

    let summary = recorder.summary();
    let verdict =
        ThresholdEvaluator::new(config.failure_threshold).evaluate(&summary, virtual_users);
    let latency = LatencyDigest::new(&recorder.latencies());

    if verdict.passed {
        info!(
            "Load test passed: failure rate {:.4} < {} ({summary})",
            verdict.failure_rate, config.failure_threshold
        );
    } else {
        warn!(
            "Load test failed: failure rate {:.4} >= {} ({summary})",
            verdict.failure_rate, config.failure_threshold
        );
    }

    Ok(RunStatistics {
        provision,
        virtual_users,
        summary,
        failure_rate: verdict.failure_rate,
        threshold: config.failure_threshold,
        passed: verdict.passed,
        latency_p50: latency.quantile(0.5),
        latency_p90: latency.quantile(0.9),
        latency_p99: latency.quantile(0.99),
        setup_elapsed,
        run_elapsed,
        records,
    })
}

/// Run `workers` virtual users, each casting exactly one vote, released together as one burst.
///
/// Every worker records exactly one outcome, including workers that panic. Records come back
/// ordered by worker index.
pub async fn run_workers(
    workload: VoteWorkload,
    ctx: Arc<ExecutionContext>,
    workers: usize,
    recorder: &OutcomeRecorder,
) -> Vec<VoteRecord> {
    let workload = Arc::new(workload);
    let start = Arc::new(Barrier::new(workers));

    debug!("Spawning {workers} virtual users");
    let handles: Vec<_> = (0..workers)
        .map(|worker_index| {
            let workload = workload.clone();
            let ctx = ctx.clone();
            let start = start.clone();
            let recorder = recorder.clone();
            tokio::spawn(
                async move {
                    start.wait().await;
                    let record = workload.run(&ctx, worker_index).await;
                    recorder.record(&record);
                    record
                }
                .in_current_span(),
            )
        })
        .collect();

    let records = collect_records(handles, &ctx, recorder).await;
    info!("All {workers} virtual users finished");
    records
}

/// Await every worker in index order. A worker that did not finish is recorded as `Failed`.
async fn collect_records(
    handles: Vec<JoinHandle<VoteRecord>>,
    ctx: &ExecutionContext,
    recorder: &OutcomeRecorder,
) -> Vec<VoteRecord> {
    let mut records = Vec::with_capacity(handles.len());
    for (worker_index, handle) in handles.into_iter().enumerate() {
        let record = match handle.await {
            Ok(record) => record,
            Err(err) => {
                error!("Virtual user {worker_index} did not finish: {err}");
                let record = VoteRecord::unsent(worker_index, ctx.assign(worker_index));
                recorder.record(&record);
                record
            }
        };
        records.push(record);
    }
    records
}
