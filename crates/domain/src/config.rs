//! Configuration structures
//!
//! Typed configuration for every subsystem. Values are produced by the
//! loader in the infra crate (environment first, file fallback).

use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub igdb: IgdbConfig,
    pub database: DatabaseConfig,
    pub workers: WorkerConfig,
}

/// Message broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Path of the broker's backing store
    pub path: String,
    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Upstream catalog API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgdbConfig {
    /// Token endpoint for the client-credentials exchange
    pub auth_url: String,
    /// Base URL of the catalog API
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Catalog database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Polling worker settings, shared by all topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between polling cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Messages fetched per cycle
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_messages() -> usize {
    1
}
