use async_trait::async_trait;
use crate::lexicon::Lexicon;
use crate::types::{ArticleRef, Company, Keyword, PickupRecord};
use crate::Result;

#[async_trait]
pub trait ArticleRegistry: Send + Sync {
    /// Register a URL. Fails with `DuplicateEntry` if it is already registered.
    async fn add_article(&self, url: &str) -> Result<ArticleRef>;

    /// Register every URL that is not registered yet, returning how many were inserted.
    async fn add_articles_ignoring_duplicates(&self, urls: &[String]) -> Result<usize>;

    async fn list_articles(&self) -> Result<Vec<ArticleRef>>;

    async fn get_article(&self, id: i64) -> Result<ArticleRef>;

    /// Fails with `NotFound` if no article has this id.
    async fn delete_article(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait LexiconStorage: Send + Sync {
    async fn add_keyword(&self, word: &str) -> Result<Keyword>;

    async fn list_keywords(&self) -> Result<Vec<Keyword>>;

    async fn delete_keyword(&self, id: i64) -> Result<()>;

    async fn add_company(&self, name: &str) -> Result<Company>;

    async fn list_companies(&self) -> Result<Vec<Company>>;

    async fn delete_company(&self, id: i64) -> Result<()>;

    /// Snapshot of the current keyword and company sets.
    async fn lexicon(&self) -> Result<Lexicon> {
        let keywords = self.list_keywords().await?;
        let companies = self.list_companies().await?;
        Ok(Lexicon::from_entries(&keywords, &companies))
    }
}

#[async_trait]
pub trait PickupStorage: Send + Sync {
    async fn list_pickup_records(&self) -> Result<Vec<PickupRecord>>;

    /// Insert or replace the stored record for `record.url`.
    async fn upsert_pickup_record(&self, record: &PickupRecord) -> Result<()>;
}

/// Everything the pickup service needs from a storage backend.
pub trait Storage: ArticleRegistry + LexiconStorage + PickupStorage {
    fn backend_name(&self) -> &'static str;
}
