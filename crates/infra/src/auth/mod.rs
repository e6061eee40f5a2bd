//! Credential management for the upstream catalog API

pub mod token_cache;
pub mod token_manager;

pub use token_cache::TokenCache;
pub use token_manager::TokenManager;
