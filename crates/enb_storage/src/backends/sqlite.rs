use async_trait::async_trait;
use enb_core::{
    ArticleRef, ArticleRegistry, Company, EntryKind, Error, Keyword, LexiconStorage, PickupRecord,
    PickupStorage, Result, Storage, StorageSettings,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use crate::paths::{candidate_paths, resolve_db_path};
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS keywords (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pickup_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        matched_keywords TEXT NOT NULL,
        matched_companies TEXT NOT NULL,
        importance TEXT NOT NULL,
        summary TEXT NOT NULL,
        url TEXT UNIQUE NOT NULL
    )
    "#,
];

/// SQLite storage. Every operation checks a connection out of the pool and
/// returns it when the query future completes or is dropped.
#[derive(Debug, Clone)]
pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be creatable at one of the configured locations"
    }

    async fn open(settings: &StorageSettings) -> Result<Self> {
        let db_path = resolve_db_path(&candidate_paths(settings))?;
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        info!("🗄️ SQLite database ready at {}", db_path.display());
        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn insert_unique(&self, table: &str, column: &str, kind: EntryKind, value: &str) -> Result<i64> {
        let result = sqlx::query(&format!("INSERT INTO {} ({}) VALUES (?)", table, column))
            .bind(value)
            .execute(&*self.pool)
            .await
            .map_err(|e| insert_error(e, kind, value))?;
        Ok(result.last_insert_rowid())
    }

    async fn list_unique(&self, table: &str, column: &str) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query(&format!("SELECT id, {} FROM {} ORDER BY id", column, table))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list {}: {}", table, e)))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<i64, _>("id"), row.get::<String, _>(column)))
            .collect())
    }

    async fn delete_by_id(&self, table: &str, kind: EntryKind, id: i64) -> Result<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete from {}: {}", table, e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound { kind, id });
        }
        Ok(())
    }
}

fn insert_error(e: sqlx::Error, kind: EntryKind, value: &str) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateEntry {
            kind,
            value: value.to_string(),
        },
        _ => Error::Database(format!("Failed to insert {}: {}", kind, e)),
    }
}

#[async_trait]
impl ArticleRegistry for SQLiteStorage {
    async fn add_article(&self, url: &str) -> Result<ArticleRef> {
        let id = self.insert_unique("articles", "url", EntryKind::Article, url).await?;
        Ok(ArticleRef { id, url: url.to_string() })
    }

    async fn add_articles_ignoring_duplicates(&self, urls: &[String]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut inserted = 0;
        for url in urls {
            let result = sqlx::query("INSERT OR IGNORE INTO articles (url) VALUES (?)")
                .bind(url)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to register {}: {}", url, e)))?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit articles: {}", e)))?;
        Ok(inserted)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleRef>> {
        Ok(self
            .list_unique("articles", "url")
            .await?
            .into_iter()
            .map(|(id, url)| ArticleRef { id, url })
            .collect())
    }

    async fn get_article(&self, id: i64) -> Result<ArticleRef> {
        let row = sqlx::query("SELECT id, url FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to load article {}: {}", id, e)))?
            .ok_or(Error::NotFound { kind: EntryKind::Article, id })?;

        Ok(ArticleRef {
            id: row.get("id"),
            url: row.get("url"),
        })
    }

    async fn delete_article(&self, id: i64) -> Result<()> {
        self.delete_by_id("articles", EntryKind::Article, id).await
    }
}

#[async_trait]
impl LexiconStorage for SQLiteStorage {
    async fn add_keyword(&self, word: &str) -> Result<Keyword> {
        let id = self.insert_unique("keywords", "word", EntryKind::Keyword, word).await?;
        Ok(Keyword { id, word: word.to_string() })
    }

    async fn list_keywords(&self) -> Result<Vec<Keyword>> {
        Ok(self
            .list_unique("keywords", "word")
            .await?
            .into_iter()
            .map(|(id, word)| Keyword { id, word })
            .collect())
    }

    async fn delete_keyword(&self, id: i64) -> Result<()> {
        self.delete_by_id("keywords", EntryKind::Keyword, id).await
    }

    async fn add_company(&self, name: &str) -> Result<Company> {
        let id = self.insert_unique("companies", "name", EntryKind::Company, name).await?;
        Ok(Company { id, name: name.to_string() })
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        Ok(self
            .list_unique("companies", "name")
            .await?
            .into_iter()
            .map(|(id, name)| Company { id, name })
            .collect())
    }

    async fn delete_company(&self, id: i64) -> Result<()> {
        self.delete_by_id("companies", EntryKind::Company, id).await
    }
}

#[async_trait]
impl PickupStorage for SQLiteStorage {
    async fn list_pickup_records(&self) -> Result<Vec<PickupRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT title, matched_keywords, matched_companies, importance, summary, url
            FROM pickup_results
            ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list pickup results: {}", e)))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let matched_keywords: String = row.get("matched_keywords");
            let matched_companies: String = row.get("matched_companies");
            let importance: String = row.get("importance");

            records.push(PickupRecord {
                title: row.get("title"),
                matched_keywords: serde_json::from_str(&matched_keywords)?,
                matched_companies: serde_json::from_str(&matched_companies)?,
                importance: importance.parse()?,
                summary: row.get("summary"),
                url: row.get("url"),
            });
        }
        Ok(records)
    }

    async fn upsert_pickup_record(&self, record: &PickupRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pickup_results
            (title, matched_keywords, matched_companies, importance, summary, url)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                matched_keywords = excluded.matched_keywords,
                matched_companies = excluded.matched_companies,
                importance = excluded.importance,
                summary = excluded.summary
            "#,
        )
        .bind(&record.title)
        .bind(serde_json::to_string(&record.matched_keywords)?)
        .bind(serde_json::to_string(&record.matched_companies)?)
        .bind(record.importance.as_str())
        .bind(&record.summary)
        .bind(&record.url)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to store pickup result: {}", e)))?;

        Ok(())
    }
}

impl Storage for SQLiteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
