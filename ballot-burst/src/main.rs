use ballot_burst::cli::Cli;
use ballot_burst::LoadTest;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ballot_burst=info")),
        )
        .init();

    let cli = Cli::parse();

    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.prometheus {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!("Serving Prometheus metrics on {addr}");
    }

    let config = cli.into_config()?;
    let stats = LoadTest::new(config).await?;

    println!("{stats}");

    Ok(if stats.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
