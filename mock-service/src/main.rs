use clap::Parser;
use mock_service::MockConfig;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Local stand-in for the election API.
#[derive(Parser, Debug)]
#[command(version)]
struct MockCli {
    #[arg(short, long, env = "MOCK_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    #[arg(long, env = "MOCK_ADMIN_TOKEN", default_value = "mock-admin-token")]
    admin_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info")),
        )
        .init();

    let args = MockCli::parse();
    let config = MockConfig {
        admin_token: args.admin_token,
        ..MockConfig::default()
    };

    tracing::info!("Mock election API listening on {}", args.addr);
    mock_service::run(args.addr, config).await?;
    Ok(())
}
