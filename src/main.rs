//! Access Ledger Server - Binary Entry Point
//!
//! Sets up tracing, opens the journaled store, loads the directory seed and
//! serves the REST API until Ctrl+C.

use std::sync::Arc;

use access_ledger::api::{create_router, AppState};
use access_ledger::{
    AccessLedger, AppResult, InMemoryDirectory, LedgerConfig, MemoryEventStore, RegisterBroadcaster,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    init_tracing();

    let config = LedgerConfig::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        match_scope = ?config.match_scope,
        utc_offset = %config.utc_offset,
        "starting access ledger"
    );

    let store = Arc::new(MemoryEventStore::open(&config.store_config())?);

    let directory = match config.directory_file {
        Some(ref path) => Arc::new(InMemoryDirectory::from_json_file(path)?),
        None => {
            warn!("no directory seed configured, every register will be unauthorized");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let broadcaster = Arc::new(RegisterBroadcaster::new(config.broadcast_capacity));
    let ledger = AccessLedger::new(store, directory.clone(), directory)
        .with_notifier(broadcaster.clone())
        .with_match_scope(config.match_scope);

    let state = Arc::new(AppState::new(Arc::new(ledger), broadcaster, config.utc_offset));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("access ledger listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
