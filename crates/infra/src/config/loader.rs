//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GAMESYNC_BROKER_PATH`: Broker store path
//! - `GAMESYNC_BROKER_POOL_SIZE`: Broker pool size (optional, default 4)
//! - `GAMESYNC_IGDB_AUTH_URL`: Token endpoint URL
//! - `GAMESYNC_IGDB_BASE_URL`: Catalog API base URL
//! - `GAMESYNC_IGDB_CLIENT_ID`: API client id
//! - `GAMESYNC_IGDB_CLIENT_SECRET`: API client secret
//! - `GAMESYNC_DB_PATH`: Catalog database path
//! - `GAMESYNC_DB_POOL_SIZE`: Catalog pool size (optional, default 4)
//! - `GAMESYNC_POLL_INTERVAL`: Worker poll interval in seconds (optional)
//! - `GAMESYNC_MAX_MESSAGES`: Messages per receive (optional, default 1)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./gamesync.json` or `./gamesync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)

use std::path::{Path, PathBuf};

use gamesync_domain::{
    BrokerConfig, Config, DatabaseConfig, GameSyncError, IgdbConfig, Result, WorkerConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `GameSyncError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `GameSyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let broker_path = env_var("GAMESYNC_BROKER_PATH")?;
    let broker_pool_size = env_parse("GAMESYNC_BROKER_POOL_SIZE", 4)?;

    let auth_url = env_var("GAMESYNC_IGDB_AUTH_URL")?;
    let base_url = env_var("GAMESYNC_IGDB_BASE_URL")?;
    let client_id = env_var("GAMESYNC_IGDB_CLIENT_ID")?;
    let client_secret = env_var("GAMESYNC_IGDB_CLIENT_SECRET")?;

    let db_path = env_var("GAMESYNC_DB_PATH")?;
    let db_pool_size = env_parse("GAMESYNC_DB_POOL_SIZE", 4)?;

    let poll_interval_seconds = env_parse("GAMESYNC_POLL_INTERVAL", 5)?;
    let max_messages = env_parse("GAMESYNC_MAX_MESSAGES", 1)?;

    Ok(Config {
        broker: BrokerConfig { path: broker_path, pool_size: broker_pool_size },
        igdb: IgdbConfig { auth_url, base_url, client_id, client_secret },
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        workers: WorkerConfig { poll_interval_seconds, max_messages },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GameSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GameSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GameSyncError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GameSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(contents)
            .map_err(|e| GameSyncError::Config(format!("Invalid TOML config: {e}")))
    } else {
        serde_json::from_str(contents)
            .map_err(|e| GameSyncError::Config(format!("Invalid JSON config: {e}")))
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "config.json",
        "config.toml",
        "gamesync.json",
        "gamesync.toml",
        "../config.json",
        "../config.toml",
    ];

    candidates.into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| GameSyncError::Config(format!("Missing environment variable: {name}")))
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| GameSyncError::Config(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_config() {
        let json = r#"{
            "broker": {"path": "/tmp/broker.db", "pool_size": 2},
            "igdb": {
                "auth_url": "https://id.twitch.tv/oauth2/token",
                "base_url": "https://api.igdb.com/v4",
                "client_id": "id",
                "client_secret": "secret"
            },
            "database": {"path": "/tmp/catalog.db"},
            "workers": {"poll_interval_seconds": 10, "max_messages": 1}
        }"#;

        let config = parse_config(json, Path::new("config.json")).expect("parsed");

        assert_eq!(config.broker.path, "/tmp/broker.db");
        assert_eq!(config.broker.pool_size, 2);
        // Omitted pool size falls back to the default.
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.workers.poll_interval_seconds, 10);
    }

    #[test]
    fn parses_toml_config() {
        let toml = r#"
            [broker]
            path = "/tmp/broker.db"

            [igdb]
            auth_url = "https://id.twitch.tv/oauth2/token"
            base_url = "https://api.igdb.com/v4"
            client_id = "id"
            client_secret = "secret"

            [database]
            path = "/tmp/catalog.db"

            [workers]
        "#;

        let config = parse_config(toml, Path::new("config.toml")).expect("parsed");

        assert_eq!(config.igdb.client_id, "id");
        assert_eq!(config.workers.max_messages, 1);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let result = parse_config("{not json", Path::new("config.json"));
        assert!(matches!(result, Err(GameSyncError::Config(_))));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(GameSyncError::Config(_))));
    }
}
