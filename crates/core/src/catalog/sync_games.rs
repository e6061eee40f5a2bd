//! Games synchronization use case

use std::sync::Arc;

use async_trait::async_trait;
use gamesync_domain::{Game, GameSyncError, GamesSyncSignal, Result};
use tracing::{info, warn};

use super::ports::{CatalogProvider, GameRepository};
use crate::messaging::SignalHandler;

/// Fetches games for the signalled platforms and upserts them locally.
pub struct SyncGamesUseCase {
    catalog: Arc<dyn CatalogProvider>,
    games: Arc<dyn GameRepository>,
}

impl SyncGamesUseCase {
    pub fn new(catalog: Arc<dyn CatalogProvider>, games: Arc<dyn GameRepository>) -> Self {
        Self { catalog, games }
    }

    /// Run one synchronization pass. Returns the number of games written.
    pub async fn execute(&self, signal: &GamesSyncSignal) -> Result<usize> {
        info!(platform_ids = ?signal.platform_ids, "Fetching games from the catalog API");

        let fetched = self.catalog.fetch_games_by_platforms(&signal.platform_ids).await?;
        if fetched.is_empty() {
            warn!("No games found in the API response");
            return Ok(0);
        }

        info!(count = fetched.len(), "Fetched games from the catalog API");

        let games = fetched
            .iter()
            .map(|dto| {
                let data = serde_json::to_string(dto)
                    .map_err(|err| GameSyncError::Internal(err.to_string()))?;
                Ok(Game::from_dto(dto, data))
            })
            .collect::<Result<Vec<_>>>()?;

        self.games.add_or_update_range(&games).await?;
        info!(count = games.len(), "Synchronized games to the database");

        Ok(games.len())
    }
}

#[async_trait]
impl SignalHandler<GamesSyncSignal> for SyncGamesUseCase {
    async fn handle(&self, signal: GamesSyncSignal) -> Result<()> {
        self.execute(&signal).await.map(|_| ())
    }
}
