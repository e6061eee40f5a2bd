use std::sync::Arc;

use gamesync_infra::SqliteMessageBroker;
use tempfile::TempDir;

/// Temporary broker wrapper that keeps the underlying store alive for the
/// duration of a test run.
pub struct TestBroker {
    pub broker: Arc<SqliteMessageBroker>,
    _temp_dir: TempDir,
}

impl TestBroker {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let broker = SqliteMessageBroker::new(temp_dir.path().join("broker.db"), 4);
        Self { broker: Arc::new(broker), _temp_dir: temp_dir }
    }
}

impl Default for TestBroker {
    fn default() -> Self {
        Self::new()
    }
}
