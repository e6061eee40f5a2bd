//! Catalog synchronization ports and use cases

pub mod ports;
pub mod sync_games;
pub mod sync_genres;

pub use ports::{AccessTokenProvider, CatalogProvider, GameRepository, GenreRepository};
pub use sync_games::SyncGamesUseCase;
pub use sync_genres::SyncGenresUseCase;
