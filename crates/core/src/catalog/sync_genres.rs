//! Genres synchronization use case

use std::sync::Arc;

use async_trait::async_trait;
use gamesync_domain::{GameSyncError, Genre, GenresSyncSignal, Result};
use tracing::{info, warn};

use super::ports::{CatalogProvider, GenreRepository};
use crate::messaging::SignalHandler;

/// Fetches the full genre list and upserts it locally.
pub struct SyncGenresUseCase {
    catalog: Arc<dyn CatalogProvider>,
    genres: Arc<dyn GenreRepository>,
}

impl SyncGenresUseCase {
    pub fn new(catalog: Arc<dyn CatalogProvider>, genres: Arc<dyn GenreRepository>) -> Self {
        Self { catalog, genres }
    }

    /// Run one synchronization pass. Returns the number of genres written.
    pub async fn execute(&self, _signal: &GenresSyncSignal) -> Result<usize> {
        info!("Fetching genres from the catalog API");

        let fetched = self.catalog.fetch_genres().await?;
        if fetched.is_empty() {
            warn!("No genres found in the API response");
            return Ok(0);
        }

        info!(count = fetched.len(), "Fetched genres from the catalog API");

        let genres = fetched
            .iter()
            .map(|dto| {
                let data = serde_json::to_string(dto)
                    .map_err(|err| GameSyncError::Internal(err.to_string()))?;
                Ok(Genre::from_dto(dto, data))
            })
            .collect::<Result<Vec<_>>>()?;

        self.genres.add_or_update_range(&genres).await?;
        info!(count = genres.len(), "Synchronized genres to the database");

        Ok(genres.len())
    }
}

#[async_trait]
impl SignalHandler<GenresSyncSignal> for SyncGenresUseCase {
    async fn handle(&self, signal: GenresSyncSignal) -> Result<()> {
        self.execute(&signal).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use gamesync_domain::{IgdbGame, IgdbGenre};
    use tokio::sync::Mutex as TokioMutex;

    use super::*;

    struct MockCatalog {
        genres: Vec<IgdbGenre>,
    }

    #[async_trait]
    impl CatalogProvider for MockCatalog {
        async fn fetch_genres(&self) -> Result<Vec<IgdbGenre>> {
            Ok(self.genres.clone())
        }

        async fn fetch_games_by_platforms(&self, _platform_ids: &[i64]) -> Result<Vec<IgdbGame>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MockGenreRepo {
        stored: TokioMutex<Vec<Genre>>,
    }

    #[async_trait]
    impl GenreRepository for MockGenreRepo {
        async fn add_or_update_range(&self, genres: &[Genre]) -> Result<()> {
            self.stored.lock().await.extend_from_slice(genres);
            Ok(())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Genre>> {
            Ok(self.stored.lock().await.iter().find(|g| g.id == id).cloned())
        }
    }

    #[tokio::test]
    async fn syncs_fetched_genres() {
        let catalog = Arc::new(MockCatalog {
            genres: vec![
                IgdbGenre { id: 5, name: "Shooter".to_string(), slug: "shooter".to_string() },
                IgdbGenre { id: 31, name: "Adventure".to_string(), slug: "adventure".to_string() },
            ],
        });
        let repo = Arc::new(MockGenreRepo::default());
        let use_case = SyncGenresUseCase::new(catalog, repo.clone());

        let count = use_case.execute(&GenresSyncSignal::default()).await.expect("sync succeeds");

        assert_eq!(count, 2);
        let stored = repo.stored.lock().await;
        assert_eq!(stored[0].slug, "shooter");
        assert!(stored[1].data.contains("\"adventure\""));
    }

    #[tokio::test]
    async fn empty_api_response_short_circuits_without_writes() {
        let catalog = Arc::new(MockCatalog { genres: Vec::new() });
        let repo = Arc::new(MockGenreRepo::default());
        let use_case = SyncGenresUseCase::new(catalog, repo.clone());

        let count = use_case.execute(&GenresSyncSignal::default()).await.expect("sync succeeds");

        assert_eq!(count, 0);
        assert!(repo.stored.lock().await.is_empty());
    }
}
