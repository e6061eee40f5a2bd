//! # GameSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The generic message processor with DLQ quarantine
//! - Catalog synchronization use cases
//!
//! ## Architecture Principles
//! - Only depends on `gamesync-domain`
//! - No database, HTTP, or broker code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod catalog;
pub mod messaging;

// Re-export specific items to avoid ambiguity
pub use catalog::ports::{AccessTokenProvider, CatalogProvider, GameRepository, GenreRepository};
pub use catalog::{SyncGamesUseCase, SyncGenresUseCase};
pub use messaging::ports::{dlq_name, MessageBroker, DLQ_SUFFIX};
pub use messaging::{MessageProcessor, SignalHandler};
