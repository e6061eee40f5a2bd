//! Catalog database implementations

pub mod game_repository;
pub mod genre_repository;
pub mod manager;

pub use game_repository::SqliteGameRepository;
pub use genre_repository::SqliteGenreRepository;
pub use manager::{DbConnection, DbManager};
