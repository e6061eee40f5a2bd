//! GameSync daemon entry point.
//!
//! Loads configuration, wires the application context and runs one polling
//! worker per synchronization topic until interrupted.

mod context;

use gamesync_infra::config::loader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(_) => warn!("No .env file found, relying on process environment"),
    }

    let config = loader::load()?;

    let mut ctx = context::AppContext::new(&config)?;

    ctx.games_worker.start().map_err(|e| format!("games worker: {e}"))?;
    ctx.genres_worker.start().map_err(|e| format!("genres worker: {e}"))?;

    info!("GameSync daemon running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if let Err(e) = ctx.games_worker.stop().await {
        error!("Failed to stop games worker: {e}");
    }
    if let Err(e) = ctx.genres_worker.stop().await {
        error!("Failed to stop genres worker: {e}");
    }

    ctx.broker.close();
    info!("GameSync daemon stopped");

    Ok(())
}
