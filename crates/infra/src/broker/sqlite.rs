//! SQLite-backed durable message broker.
//!
//! Queue and DLQ state live in on-disk tables, so published messages survive
//! process restarts. The backing pool is created lazily on first use and
//! shared across all operations; each operation borrows a pooled connection
//! that is returned on every exit path. [`SqliteMessageBroker::close`]
//! disposes the pool exactly once and is safe to call repeatedly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gamesync_core::{dlq_name, MessageBroker};
use gamesync_domain::{GameSyncError, Result};
use parking_lot::Mutex;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;
use tracing::{debug, info, warn};

const SCHEMA_SQL: &str = include_str!("schema.sql");

type BrokerPool = Pool<SqliteConnectionManager>;
type BrokerConnection = PooledConnection<SqliteConnectionManager>;

/// A message that was rejected into a dead-letter queue.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedMessage {
    pub body: String,
    pub original_queue: String,
    pub reason: String,
    /// ISO-8601 rejection timestamp
    pub rejected_at: String,
}

#[derive(Default)]
struct PoolState {
    pool: Option<BrokerPool>,
    closed: bool,
}

struct BrokerInner {
    path: PathBuf,
    pool_size: u32,
    state: Mutex<PoolState>,
}

impl BrokerInner {
    /// Borrow a pooled connection, creating the pool on first use.
    fn connection(&self) -> Result<BrokerConnection> {
        let pool = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(GameSyncError::Broker("broker has been closed".into()));
            }
            if state.pool.is_none() {
                state.pool = Some(create_pool(&self.path, self.pool_size)?);
                info!(path = %self.path.display(), "broker store initialised");
            }
            // Pool handles are cheap clones over the shared inner pool.
            state.pool.clone()
        };

        pool.ok_or_else(|| GameSyncError::Broker("broker pool unavailable".into()))?
            .get()
            .map_err(|err| GameSyncError::Broker(format!("failed to acquire connection: {err}")))
    }
}

/// Durable message broker on an embedded SQLite store.
pub struct SqliteMessageBroker {
    inner: Arc<BrokerInner>,
}

impl SqliteMessageBroker {
    /// Create a broker over the store at `path`. No connection is opened
    /// until the first operation runs.
    pub fn new<P: AsRef<Path>>(path: P, pool_size: u32) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                path: path.as_ref().to_path_buf(),
                pool_size: pool_size.max(1),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// Dispose the shared pool. Idempotent: later calls (and calls before
    /// any connection was ever created) are no-ops.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        if state.pool.take().is_some() {
            info!("broker store closed");
        } else {
            debug!("broker closed before any connection was created");
        }
    }

    /// Inspect a queue's dead-letter contents without consuming them.
    pub async fn rejected_messages(&self, queue: &str) -> Result<Vec<RejectedMessage>> {
        let inner = Arc::clone(&self.inner);
        let dlq = dlq_name(queue);

        task::spawn_blocking(move || -> Result<Vec<RejectedMessage>> {
            let conn = inner.connection()?;
            query_rejected(&conn, &dlq).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Number of messages currently waiting in a queue.
    pub async fn queue_depth(&self, queue: &str) -> Result<usize> {
        let inner = Arc::clone(&self.inner);
        let queue = queue.to_string();

        task::spawn_blocking(move || -> Result<usize> {
            let conn = inner.connection()?;
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE queue = ?1",
                params![queue],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count as usize)
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl MessageBroker for SqliteMessageBroker {
    async fn publish(&self, queue: &str, message: &str) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let queue = queue.to_string();
        let message = message.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = inner.connection()?;
            let dlq = dlq_name(&queue);
            declare_queue(&conn, &queue, Some(&dlq)).map_err(map_sql_error)?;
            declare_queue(&conn, &dlq, None).map_err(map_sql_error)?;

            conn.execute(
                "INSERT INTO messages (queue, body, created_at) VALUES (?1, ?2, ?3)",
                params![queue, message, Utc::now().timestamp()],
            )
            .map_err(map_sql_error)?;

            info!(queue = %queue, "Message published");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn receive(&self, queue: &str, max_messages: usize) -> Result<Vec<String>> {
        let inner = Arc::clone(&self.inner);
        let queue = queue.to_string();

        task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut conn = inner.connection()?;
            declare_queue(&conn, &queue, Some(&dlq_name(&queue))).map_err(map_sql_error)?;

            debug!(queue = %queue, max_messages, "Receiving messages");

            let mut messages = Vec::new();
            for _ in 0..max_messages {
                match fetch_and_ack(&mut conn, &queue).map_err(map_sql_error)? {
                    Some(body) => messages.push(body),
                    None => {
                        debug!(queue = %queue, "No more messages available");
                        break;
                    }
                }
            }

            info!(queue = %queue, count = messages.len(), "Messages received");
            Ok(messages)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn reject_to_dlq(&self, queue: &str, message: &str, reason: &str) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let queue = queue.to_string();
        let message = message.to_string();
        let reason = reason.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = inner.connection()?;
            let dlq = dlq_name(&queue);
            declare_queue(&conn, &dlq, None).map_err(map_sql_error)?;

            conn.execute(
                "INSERT INTO messages (queue, body, created_at, original_queue, reason, rejected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dlq,
                    message,
                    Utc::now().timestamp(),
                    queue,
                    reason,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(map_sql_error)?;

            warn!(queue = %queue, dlq = %dlq, reason = %reason, "Message rejected to DLQ");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

impl Drop for SqliteMessageBroker {
    fn drop(&mut self) {
        // Only the last handle disposes the pool.
        if Arc::strong_count(&self.inner) == 1 {
            self.close();
        }
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn create_pool(path: &Path, pool_size: u32) -> Result<BrokerPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| {
                GameSyncError::Broker(format!("failed to create broker directory: {err}"))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        // journal_mode returns a row, so it cannot go through execute_batch
        conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)
    });

    Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|err| GameSyncError::Broker(format!("failed to open broker store: {err}")))
}

/// Idempotent queue declaration: re-declaring an existing queue is a no-op.
fn declare_queue(
    conn: &Connection,
    queue: &str,
    dead_letter_target: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO queues (name, dead_letter_target, created_at) VALUES (?1, ?2, ?3)",
        params![queue, dead_letter_target, Utc::now().timestamp()],
    )?;
    Ok(())
}

/// Remove and return the oldest message in one transaction, so the fetch and
/// its acknowledgement are atomic from the caller's point of view.
fn fetch_and_ack(conn: &mut Connection, queue: &str) -> rusqlite::Result<Option<String>> {
    let tx = conn.transaction()?;

    let row: Option<(i64, String)> = tx
        .query_row(
            "SELECT id, body FROM messages WHERE queue = ?1 ORDER BY id LIMIT 1",
            params![queue],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let result = match row {
        Some((id, body)) => {
            tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            Some(body)
        }
        None => None,
    };

    tx.commit()?;
    Ok(result)
}

fn query_rejected(conn: &Connection, dlq: &str) -> rusqlite::Result<Vec<RejectedMessage>> {
    let mut stmt = conn.prepare(
        "SELECT body, original_queue, reason, rejected_at
         FROM messages WHERE queue = ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![dlq], |row| {
        Ok(RejectedMessage {
            body: row.get(0)?,
            original_queue: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            reason: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            rejected_at: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    })?;

    rows.collect()
}

// ============================================================================
// Error Mapping
// ============================================================================

fn map_sql_error(err: rusqlite::Error) -> GameSyncError {
    GameSyncError::Broker(err.to_string())
}

fn map_join_error(err: task::JoinError) -> GameSyncError {
    if err.is_cancelled() {
        GameSyncError::Internal("blocking task cancelled".into())
    } else {
        GameSyncError::Internal(format!("blocking task failed: {err}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
