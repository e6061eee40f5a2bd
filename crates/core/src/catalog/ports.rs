//! Port interfaces for catalog synchronization

use async_trait::async_trait;
use gamesync_domain::{Game, Genre, IgdbGame, IgdbGenre, Result};

/// Trait for fetching catalog data from the upstream API
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch all genres from the catalog
    async fn fetch_genres(&self) -> Result<Vec<IgdbGenre>>;

    /// Fetch all games available on the given platforms
    async fn fetch_games_by_platforms(&self, platform_ids: &[i64]) -> Result<Vec<IgdbGame>>;
}

/// Trait for persisting game entities
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Insert or update a batch of games keyed by upstream id
    async fn add_or_update_range(&self, games: &[Game]) -> Result<()>;

    /// Look up a game by upstream id
    async fn find_by_id(&self, id: i64) -> Result<Option<Game>>;
}

/// Trait for persisting genre entities
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// Insert or update a batch of genres keyed by upstream id
    async fn add_or_update_range(&self, genres: &[Genre]) -> Result<()>;

    /// Look up a genre by upstream id
    async fn find_by_id(&self, id: i64) -> Result<Option<Genre>>;
}

/// Trait for obtaining a valid bearer token for outbound API calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a currently valid access token, refreshing it if necessary
    async fn get_valid_token(&self) -> Result<String>;
}
