use crate::state::SeenBackend;
use crate::types::{Result, SeenRecord};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

/// Seen-set persisted in a single SQLite table keyed by identity hash.
pub struct SqliteSeenBackend {
    db: SqlitePool,
}

impl SqliteSeenBackend {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let backend = Self { db };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                processed_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM seen_articles")
            .fetch_one(&self.db)
            .await?;
        Ok(row.try_get("total")?)
    }

    pub async fn title_of(&self, id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT title FROM seen_articles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|row| row.try_get("title")).transpose()?)
    }
}

#[async_trait]
impl SeenBackend for SqliteSeenBackend {
    async fn existing(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM seen_articles WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.db).await?;
        let mut found = HashSet::with_capacity(rows.len());
        for row in rows {
            found.insert(row.try_get::<String, _>("id")?);
        }
        Ok(found)
    }

    async fn commit(&self, records: &[SeenRecord]) -> Result<()> {
        let mut tx = self.db.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO seen_articles (id, title, url, processed_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.link)
            .bind(record.processed_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Wrote {} rows to seen_articles", records.len());
        Ok(())
    }
}
