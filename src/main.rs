use searxng_mcp::config::{AppConfig, ConfigLoader, TransportKind};
use searxng_mcp::mcp;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config: AppConfig = ConfigLoader::load()?;
    info!(
        transport = ?config.transport,
        backend = %config.searxng_url,
        "configuration loaded"
    );

    match config.transport {
        TransportKind::Stdio => mcp::run_stdio_server(&config).await,
        TransportKind::Http => mcp::run_http_server(&config).await,
    }
}

fn init_tracing() {
    // Stdio transport owns stdout, so logs must go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
