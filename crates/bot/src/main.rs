use bot::app;
use bot::config::Config;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // A bad configuration cannot be fixed by restarting, so it is fatal
    let config = Config::from_env().inspect_err(|e| tracing::error!("{e}"))?;
    tracing::info!(
        transport = ?config.transport,
        port = config.port,
        engine = %config.engine_command.program.display(),
        "Starting BoardSight"
    );

    app::run(config).await
}
