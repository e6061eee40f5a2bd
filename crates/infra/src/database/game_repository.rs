//! SQLite-backed game repository

use std::sync::Arc;

use async_trait::async_trait;
use gamesync_core::GameRepository as GameRepositoryPort;
use gamesync_domain::{Game, GameSyncError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};

/// SQLite implementation of the game repository port.
pub struct SqliteGameRepository {
    db: Arc<DbManager>,
}

impl SqliteGameRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GameRepositoryPort for SqliteGameRepository {
    async fn add_or_update_range(&self, games: &[Game]) -> Result<()> {
        let db = Arc::clone(&self.db);
        let games = games.to_vec();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db.get_connection()?;
            upsert_games(&mut conn, &games).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Game>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<Game>> {
            let conn = db.get_connection()?;
            query_game(&conn, id).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn upsert_games(conn: &mut Connection, games: &[Game]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO games (id, name, genres, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 genres = excluded.genres,
                 data = excluded.data,
                 updated_at = excluded.updated_at",
        )?;

        for game in games {
            let genres_json = serde_json::to_string(&game.genres).unwrap_or_else(|_| "[]".into());
            stmt.execute(params![
                game.id,
                game.name,
                genres_json,
                game.data,
                game.created_at,
                game.updated_at,
            ])?;
        }
    }
    tx.commit()
}

fn query_game(conn: &Connection, id: i64) -> rusqlite::Result<Option<Game>> {
    conn.query_row(
        "SELECT id, name, genres, data, created_at, updated_at FROM games WHERE id = ?1",
        params![id],
        map_game_row,
    )
    .optional()
}

fn map_game_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    let genres_json: String = row.get(2)?;
    let genres = serde_json::from_str(&genres_json).unwrap_or_default();

    Ok(Game {
        id: row.get(0)?,
        name: row.get(1)?,
        genres,
        data: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
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
