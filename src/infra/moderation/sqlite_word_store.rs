// SQLite-backed banned word store.
//
// Tables:
// - offensive_words: one row per banned word, newest has the highest id

use crate::core::moderation::{AddOutcome, RemoveOutcome, WordError, WordStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteWordStore {
    pool: Pool<Sqlite>,
}

impl SqliteWordStore {
    /// Open (or create) the database file and run migrations.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let path = database_path.trim_start_matches("sqlite://");
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), WordError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offensive_words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL UNIQUE,
                added_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| WordError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl WordStore for SqliteWordStore {
    async fn exists(&self, word: &str) -> Result<bool, WordError> {
        let row = sqlx::query("SELECT 1 FROM offensive_words WHERE word = ? LIMIT 1")
            .bind(word)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WordError::StorageError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn add(&self, word: &str) -> Result<AddOutcome, WordError> {
        // The UNIQUE constraint settles races between concurrent adds
        let result = sqlx::query(
            r#"
            INSERT INTO offensive_words (word, added_at)
            VALUES (?, ?)
            ON CONFLICT(word) DO NOTHING
            "#,
        )
        .bind(word)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| WordError::StorageError(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyExists)
        }
    }

    async fn remove(&self, word: &str) -> Result<RemoveOutcome, WordError> {
        let result = sqlx::query("DELETE FROM offensive_words WHERE word = ?")
            .bind(word)
            .execute(&self.pool)
            .await
            .map_err(|e| WordError::StorageError(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotFound)
        }
    }

    async fn list(&self) -> Result<Vec<String>, WordError> {
        let rows = sqlx::query("SELECT word FROM offensive_words ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WordError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(|row| row.get::<String, _>("word")).collect())
    }

    async fn count(&self) -> Result<usize, WordError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM offensive_words")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| WordError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>("total") as usize)
    }
}
