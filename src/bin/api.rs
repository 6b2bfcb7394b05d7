use money_commander::{api::start_server, config::AppConfig, runtime::SessionRuntime};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before the filter reads RUST_LOG
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Money Commander - API Server");
    info!("📍 Port: {}", config.port);

    let gateway = config.build_gateway()?;
    let store = config.build_store();
    let runtime = Arc::new(SessionRuntime::open(store, gateway, config.wizard).await?);

    info!("✅ Session runtime initialized");
    info!("📡 Starting API server...");

    start_server(runtime, config.port).await?;

    Ok(())
}
