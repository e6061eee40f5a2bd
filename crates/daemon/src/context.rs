//! Application context: dependency wiring for the daemon.

use std::sync::Arc;

use gamesync_core::{
    MessageBroker, SignalHandler, SyncGamesUseCase, SyncGenresUseCase,
};
use gamesync_domain::{Config, GamesSyncSignal, GenresSyncSignal, Result};
use gamesync_infra::{
    DbManager, IgdbClient, PollingWorker, PollingWorkerConfig, SqliteGameRepository,
    SqliteGenreRepository, SqliteMessageBroker, TokenCache, TokenManager,
};
use tracing::info;

pub const GAMES_QUEUE: &str = "sync_games";
pub const GENRES_QUEUE: &str = "sync_genres";

/// Fully wired application state.
pub struct AppContext {
    pub broker: Arc<SqliteMessageBroker>,
    pub games_worker: PollingWorker<GamesSyncSignal>,
    pub genres_worker: PollingWorker<GenresSyncSignal>,
}

impl AppContext {
    /// Build every component from configuration. The broker connects lazily,
    /// so constructing the context performs no broker I/O.
    pub fn new(config: &Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let broker =
            Arc::new(SqliteMessageBroker::new(&config.broker.path, config.broker.pool_size));

        // Process-wide token state, shared by every outbound API call.
        let token_cache = Arc::new(TokenCache::new());
        let token_manager = Arc::new(TokenManager::new(config.igdb.clone(), token_cache)?);

        let catalog = Arc::new(IgdbClient::new(&config.igdb, token_manager)?);

        let games_use_case = Arc::new(SyncGamesUseCase::new(
            catalog.clone(),
            Arc::new(SqliteGameRepository::new(db.clone())),
        ));
        let genres_use_case = Arc::new(SyncGenresUseCase::new(
            catalog,
            Arc::new(SqliteGenreRepository::new(db)),
        ));

        let games_worker = PollingWorker::new(
            Arc::clone(&broker) as Arc<dyn MessageBroker>,
            games_use_case as Arc<dyn SignalHandler<GamesSyncSignal>>,
            worker_config(GAMES_QUEUE, config),
        );
        let genres_worker = PollingWorker::new(
            Arc::clone(&broker) as Arc<dyn MessageBroker>,
            genres_use_case as Arc<dyn SignalHandler<GenresSyncSignal>>,
            worker_config(GENRES_QUEUE, config),
        );

        info!("Application context initialised");

        Ok(Self { broker, games_worker, genres_worker })
    }
}

fn worker_config(queue: &str, config: &Config) -> PollingWorkerConfig {
    PollingWorkerConfig {
        poll_interval: std::time::Duration::from_secs(config.workers.poll_interval_seconds),
        max_messages: config.workers.max_messages,
        ..PollingWorkerConfig::new(queue)
    }
}
