use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use studentdesk::api::{start_server, AppState, Metrics};
use studentdesk::config::Config;
use studentdesk::storage::RocksDbStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("studentdesk=info".parse()?))
        .init();

    tracing::info!("StudentDesk starting...");

    let config = Config::from_env();

    let store = Arc::new(RocksDbStore::open(&config.data_dir)?);
    tracing::info!("Opened RocksDB at {}", store.data_path().display());

    let state = Arc::new(AppState::new(
        store,
        config.counter_policy,
        Arc::new(Metrics::new()),
    ));

    // The counter row must exist before the first request is served
    let allocator = state.assignments.allocator();
    allocator.bootstrap()?;
    let counter = allocator.current()?;
    tracing::info!(
        policy = ?allocator.policy(),
        counter = ?counter,
        "Assignment sequence ready"
    );

    start_server(config.server, state, shutdown_signal()).await?;

    tracing::info!("StudentDesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
