use std::str::FromStr;

use async_trait::async_trait;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    application::{Quote, Store, StoryEvent},
    error::BotError,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS quote (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    author TEXT NOT NULL,
    original_author INTEGER
);
CREATE TABLE IF NOT EXISTS story (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event TEXT NOT NULL,
    dt TEXT NOT NULL
);
";

/// Quotes and chronicle entries kept in SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(db_path: &str) -> Result<Self, BotError> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, BotError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!("Quote store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn quotes_by_author(&self, pattern: &str) -> Result<Vec<Quote>, BotError> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT id, text, author FROM quote WHERE author LIKE ? ORDER BY id DESC",
        )
        .bind(format!("%{pattern}%"))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, text, author)| Quote { id, text, author })
            .collect())
    }

    async fn story_events(&self) -> Result<Vec<StoryEvent>, BotError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT strftime('%d.%m.%Y', dt), event FROM story ORDER BY dt DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(date, event)| StoryEvent { date, event })
            .collect())
    }

    async fn insert_quote(
        &self,
        text: &str,
        author: &str,
        submitter_id: i64,
    ) -> Result<(), BotError> {
        sqlx::query("INSERT INTO quote (text, author, original_author) VALUES (?, ?, ?)")
            .bind(text)
            .bind(author)
            .bind(submitter_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_story_event(&self, description: &str) -> Result<(), BotError> {
        sqlx::query("INSERT INTO story (event, dt) VALUES (?, datetime('now'))")
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn random_quote(&self) -> Result<Option<(String, String)>, BotError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT text, author FROM quote ORDER BY random() LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }
}
