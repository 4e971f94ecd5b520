use async_trait::async_trait;
use crate::types::{FetchedContent, ScoredPickup};
use crate::Result;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and normalize one article page.
    ///
    /// `Ok(None)` means the page was retrieved but had nothing usable in it.
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a single article. Returns whether the channel accepted it.
    async fn post(&self, pickup: &ScoredPickup) -> bool;
}
