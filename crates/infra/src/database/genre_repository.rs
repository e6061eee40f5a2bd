//! SQLite-backed genre repository

use std::sync::Arc;

use async_trait::async_trait;
use gamesync_core::GenreRepository as GenreRepositoryPort;
use gamesync_domain::{GameSyncError, Genre, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};

/// SQLite implementation of the genre repository port.
pub struct SqliteGenreRepository {
    db: Arc<DbManager>,
}

impl SqliteGenreRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GenreRepositoryPort for SqliteGenreRepository {
    async fn add_or_update_range(&self, genres: &[Genre]) -> Result<()> {
        let db = Arc::clone(&self.db);
        let genres = genres.to_vec();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db.get_connection()?;
            upsert_genres(&mut conn, &genres).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Genre>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<Genre>> {
            let conn = db.get_connection()?;
            query_genre(&conn, id).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn upsert_genres(conn: &mut Connection, genres: &[Genre]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO genres (id, name, slug, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 slug = excluded.slug,
                 data = excluded.data,
                 updated_at = excluded.updated_at",
        )?;

        for genre in genres {
            stmt.execute(params![
                genre.id,
                genre.name,
                genre.slug,
                genre.data,
                genre.created_at,
                genre.updated_at,
            ])?;
        }
    }
    tx.commit()
}

fn query_genre(conn: &Connection, id: i64) -> rusqlite::Result<Option<Genre>> {
    conn.query_row(
        "SELECT id, name, slug, data, created_at, updated_at FROM genres WHERE id = ?1",
        params![id],
        map_genre_row,
    )
    .optional()
}

fn map_genre_row(row: &Row<'_>) -> rusqlite::Result<Genre> {
    Ok(Genre {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
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

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteGenreRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("catalog.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        manager.run_migrations().expect("migrations run");

        (SqliteGenreRepository::new(manager), temp_dir)
    }

    fn sample_genre(id: i64, slug: &str) -> Genre {
        Genre {
            id,
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            data: format!(r#"{{"id":{id},"slug":"{slug}"}}"#),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stores_and_finds_genres() {
        let (repo, _dir) = setup_repository().await;

        repo.add_or_update_range(&[sample_genre(5, "shooter"), sample_genre(31, "adventure")])
            .await
            .expect("stored");

        let found = repo.find_by_id(31).await.expect("query").expect("present");
        assert_eq!(found.slug, "adventure");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_write_updates_in_place() {
        let (repo, _dir) = setup_repository().await;

        repo.add_or_update_range(&[sample_genre(5, "shooter")]).await.expect("stored");

        let mut updated = sample_genre(5, "arcade-shooter");
        updated.updated_at = 1_700_000_100;
        repo.add_or_update_range(&[updated]).await.expect("updated");

        let found = repo.find_by_id(5).await.expect("query").expect("present");
        assert_eq!(found.slug, "arcade-shooter");
        assert_eq!(found.created_at, 1_700_000_000);
    }
}
