use ballot_burst::prelude::*;
use mock_service::{Faults, MockConfig, MockHandle};
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter("ballot_burst=debug,mock_service=info,axum::rejection=trace")
            .init();
    });
}

/// Start a mock election service with the given faults and point a fresh config at it.
#[allow(unused)]
pub async fn mock_with(faults: Faults) -> (MockHandle, LoadTestConfig) {
    init();

    let mock = mock_service::spawn(MockConfig {
        faults,
        ..MockConfig::default()
    })
    .await
    .expect("mock service should bind an ephemeral port");

    let config = LoadTestConfig::new(
        parse_base_url(&mock.base_url()).expect("mock URL is valid"),
        AdminAuth::Token(mock.admin_token().to_string()),
    );

    (mock, config)
}

#[allow(unused)]
pub fn user_ids(range: std::ops::Range<usize>) -> impl Iterator<Item = String> {
    range.map(ballot_burst_core::voter_id)
}
