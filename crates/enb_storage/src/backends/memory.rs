use async_trait::async_trait;
use enb_core::{
    ArticleRef, ArticleRegistry, Company, EntryKind, Error, Keyword, LexiconStorage, PickupRecord,
    PickupStorage, Result, Storage,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

/// Autoincrement table of unique strings, enumerated in insertion order.
#[derive(Debug)]
struct UniqueTable {
    kind: EntryKind,
    next_id: i64,
    rows: Vec<(i64, String)>,
}

impl UniqueTable {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            next_id: 1,
            rows: Vec::new(),
        }
    }

    fn contains(&self, value: &str) -> bool {
        self.rows.iter().any(|(_, v)| v == value)
    }

    fn insert(&mut self, value: &str) -> Result<i64> {
        if self.contains(value) {
            return Err(Error::DuplicateEntry {
                kind: self.kind,
                value: value.to_string(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push((id, value.to_string()));
        Ok(id)
    }

    fn get(&self, id: i64) -> Result<&str> {
        self.rows
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, v)| v.as_str())
            .ok_or(Error::NotFound { kind: self.kind, id })
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let before = self.rows.len();
        self.rows.retain(|(row_id, _)| *row_id != id);
        if self.rows.len() == before {
            return Err(Error::NotFound { kind: self.kind, id });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryStore {
    articles: UniqueTable,
    keywords: UniqueTable,
    companies: UniqueTable,
    pickups: Vec<PickupRecord>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            articles: UniqueTable::new(EntryKind::Article),
            keywords: UniqueTable::new(EntryKind::Keyword),
            companies: UniqueTable::new(EntryKind::Company),
            pickups: Vec::new(),
        }
    }
}

/// Process-local storage, used for tests and `--storage memory`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should always be available"
    }

    async fn open(_settings: &enb_core::StorageSettings) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleRegistry for InMemoryStorage {
    async fn add_article(&self, url: &str) -> Result<ArticleRef> {
        let mut store = self.store.write().await;
        let id = store.articles.insert(url)?;
        Ok(ArticleRef { id, url: url.to_string() })
    }

    async fn add_articles_ignoring_duplicates(&self, urls: &[String]) -> Result<usize> {
        let mut store = self.store.write().await;
        let mut inserted = 0;
        for url in urls {
            if !store.articles.contains(url) {
                store.articles.insert(url)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleRef>> {
        let store = self.store.read().await;
        Ok(store
            .articles
            .rows
            .iter()
            .map(|(id, url)| ArticleRef { id: *id, url: url.clone() })
            .collect())
    }

    async fn get_article(&self, id: i64) -> Result<ArticleRef> {
        let store = self.store.read().await;
        let url = store.articles.get(id)?;
        Ok(ArticleRef { id, url: url.to_string() })
    }

    async fn delete_article(&self, id: i64) -> Result<()> {
        self.store.write().await.articles.delete(id)
    }
}

#[async_trait]
impl LexiconStorage for InMemoryStorage {
    async fn add_keyword(&self, word: &str) -> Result<Keyword> {
        let id = self.store.write().await.keywords.insert(word)?;
        Ok(Keyword { id, word: word.to_string() })
    }

    async fn list_keywords(&self) -> Result<Vec<Keyword>> {
        let store = self.store.read().await;
        Ok(store
            .keywords
            .rows
            .iter()
            .map(|(id, word)| Keyword { id: *id, word: word.clone() })
            .collect())
    }

    async fn delete_keyword(&self, id: i64) -> Result<()> {
        self.store.write().await.keywords.delete(id)
    }

    async fn add_company(&self, name: &str) -> Result<Company> {
        let id = self.store.write().await.companies.insert(name)?;
        Ok(Company { id, name: name.to_string() })
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let store = self.store.read().await;
        Ok(store
            .companies
            .rows
            .iter()
            .map(|(id, name)| Company { id: *id, name: name.clone() })
            .collect())
    }

    async fn delete_company(&self, id: i64) -> Result<()> {
        self.store.write().await.companies.delete(id)
    }
}

#[async_trait]
impl PickupStorage for InMemoryStorage {
    async fn list_pickup_records(&self) -> Result<Vec<PickupRecord>> {
        Ok(self.store.read().await.pickups.clone())
    }

    async fn upsert_pickup_record(&self, record: &PickupRecord) -> Result<()> {
        let mut store = self.store.write().await;
        match store.pickups.iter_mut().find(|r| r.url == record.url) {
            Some(existing) => *existing = record.clone(),
            None => store.pickups.push(record.clone()),
        }
        Ok(())
    }
}

impl Storage for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enb_core::Importance;

    #[tokio::test]
    async fn test_duplicate_article_is_rejected() {
        let storage = InMemoryStorage::new();
        let first = storage.add_article("https://example.com/a").await.unwrap();
        assert_eq!(first.id, 1);

        let err = storage.add_article("https://example.com/a").await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(storage.list_articles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_or_ignore_is_idempotent() {
        let storage = InMemoryStorage::new();
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
            "https://example.com/a".to_string(),
        ];
        assert_eq!(storage.add_articles_ignoring_duplicates(&urls).await.unwrap(), 2);
        assert_eq!(storage.add_articles_ignoring_duplicates(&urls).await.unwrap(), 0);
        assert_eq!(storage.list_articles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found() {
        let storage = InMemoryStorage::new();
        for i in 0..10 {
            storage.add_keyword(&format!("kw{}", i)).await.unwrap();
        }
        let err = storage.delete_keyword(999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntryKind::Keyword, id: 999 }));

        storage.delete_keyword(10).await.unwrap();
        assert!(storage.delete_keyword(10).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let storage = InMemoryStorage::new();
        let a = storage.add_company("ENEOS").await.unwrap();
        storage.delete_company(a.id).await.unwrap();
        let b = storage.add_company("ENEOS").await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_lexicon_snapshot_follows_insertion_order() {
        let storage = InMemoryStorage::new();
        storage.add_keyword("PPA").await.unwrap();
        storage.add_keyword("CPPA").await.unwrap();
        storage.add_company("Tesla").await.unwrap();

        let lexicon = storage.lexicon().await.unwrap();
        assert_eq!(lexicon.keywords(), &["PPA".to_string(), "CPPA".to_string()]);
        assert_eq!(lexicon.companies(), &["Tesla".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_pickup_record_replaces_by_url() {
        let storage = InMemoryStorage::new();
        let mut record = PickupRecord {
            title: "Old".to_string(),
            matched_keywords: vec![],
            matched_companies: vec![],
            importance: Importance::Low,
            summary: "old".to_string(),
            url: "https://example.com/a".to_string(),
        };
        storage.upsert_pickup_record(&record).await.unwrap();
        record.title = "New".to_string();
        storage.upsert_pickup_record(&record).await.unwrap();

        let stored = storage.list_pickup_records().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "New");
    }
}
