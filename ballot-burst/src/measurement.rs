use pdatastructs::tdigest::{TDigest, K1};
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Latency quantiles of the vote requests in a run.
#[derive(Debug, Clone)]
pub struct LatencyDigest {
    count: usize,
    latency: TDigest<K1>,
}

impl LatencyDigest {
    pub fn new(latencies: &[Duration]) -> Self {
        let mut latency = default_tdigest();
        for dur in latencies {
            latency.insert(dur.as_secs_f64());
        }
        Self {
            count: latencies.len(),
            latency,
        }
    }

    pub fn quantile(&self, quantile: f64) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);
        // TDigest can hand back NaN on degenerate inputs.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Invalid latency quantile {secs} for q={quantile}");
            0.
        };

        Duration::from_secs_f64(secs)
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
