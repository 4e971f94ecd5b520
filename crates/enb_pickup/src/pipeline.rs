use enb_core::scoring::{self, ContentFilter, NO_TITLE};
use enb_core::{ArticleRef, ContentFetcher, Lexicon, PickupRecord, ScoredPickup};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub fetch_timeout: Duration,
    /// Fetches in flight at once. Output order never depends on it.
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed(String),
    TimedOut(Duration),
    EmptyContent,
    /// Rejected by the include/exclude keyword filter.
    Filtered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
            SkipReason::TimedOut(after) => write!(f, "timed out after {:?}", after),
            SkipReason::EmptyContent => f.write_str("no usable content"),
            SkipReason::Filtered => f.write_str("filtered out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArticleOutcome {
    Picked(ScoredPickup),
    Skipped { article: ArticleRef, reason: SkipReason },
}

/// Per-article outcomes of one run, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickupReport {
    pub outcomes: Vec<ArticleOutcome>,
}

impl PickupReport {
    pub fn picked(&self) -> impl Iterator<Item = &ScoredPickup> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ArticleOutcome::Picked(pickup) => Some(pickup),
            ArticleOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&ArticleRef, &SkipReason)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ArticleOutcome::Skipped { article, reason } => Some((article, reason)),
            ArticleOutcome::Picked(_) => None,
        })
    }

    pub fn into_pickups(self) -> Vec<ScoredPickup> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ArticleOutcome::Picked(pickup) => Some(pickup),
                ArticleOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn records(&self) -> Vec<PickupRecord> {
        self.picked().map(|pickup| pickup.record.clone()).collect()
    }
}

/// Fetch, score, classify and summarize a batch of registered articles.
#[derive(Clone)]
pub struct PickupPipeline {
    fetcher: Arc<dyn ContentFetcher>,
    config: PipelineConfig,
}

impl PickupPipeline {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, config: PipelineConfig) -> Self {
        Self { fetcher, config }
    }

    /// A failing article is skipped with its reason; the batch always completes.
    pub async fn run(&self, articles: &[ArticleRef], lexicon: &Lexicon) -> PickupReport {
        self.run_filtered(articles, lexicon, &ContentFilter::default()).await
    }

    /// Like `run`, skipping fetched articles that `filter` rejects.
    pub async fn run_filtered(
        &self,
        articles: &[ArticleRef],
        lexicon: &Lexicon,
        filter: &ContentFilter,
    ) -> PickupReport {
        let outcomes: Vec<ArticleOutcome> = stream::iter(articles.iter().cloned())
            .map(|article| self.evaluate(article, lexicon, filter))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = PickupReport { outcomes };
        info!(
            "✅ Pickup run finished: {} picked, {} skipped",
            report.picked().count(),
            report.skipped().count()
        );
        report
    }

    pub async fn evaluate(
        &self,
        article: ArticleRef,
        lexicon: &Lexicon,
        filter: &ContentFilter,
    ) -> ArticleOutcome {
        let fetched = tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(&article.url)).await;

        let content = match fetched {
            Ok(Ok(Some(content))) if !content.is_empty() => content,
            Ok(Ok(_)) => return skip(article, SkipReason::EmptyContent),
            Ok(Err(e)) => return skip(article, SkipReason::FetchFailed(e.to_string())),
            Err(_) => return skip(article, SkipReason::TimedOut(self.config.fetch_timeout)),
        };

        let title = content.title.unwrap_or_else(|| NO_TITLE.to_string());
        if !filter.allows(&title, &content.body) {
            return skip(article, SkipReason::Filtered);
        }
        let relevance = scoring::score(&content.body, &title, lexicon);
        let text = format!("{} {}", content.body, title);

        ArticleOutcome::Picked(ScoredPickup {
            score: relevance.score,
            record: PickupRecord {
                importance: scoring::classify(relevance.score),
                summary: scoring::summarize(&text, &title),
                title,
                matched_keywords: relevance.matched_keywords,
                matched_companies: relevance.matched_companies,
                url: article.url,
            },
        })
    }
}

fn skip(article: ArticleRef, reason: SkipReason) -> ArticleOutcome {
    warn!("⏭️ Skipping {}: {}", article.url, reason);
    ArticleOutcome::Skipped { article, reason }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use enb_core::{Error, FetchedContent, Importance, Result};
    use std::collections::HashMap;

    /// Serves canned pages by URL. Unknown URLs fail, `None` pages are empty.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        pub pages: HashMap<String, Option<FetchedContent>>,
        pub slow: Vec<String>,
    }

    impl StubFetcher {
        pub fn page(mut self, url: &str, title: Option<&str>, body: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                Some(FetchedContent::new(title.map(str::to_string), body)),
            );
            self
        }

        pub fn empty(mut self, url: &str) -> Self {
            self.pages.insert(url.to_string(), None);
            self
        }

        pub fn slow(mut self, url: &str) -> Self {
            self.slow.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>> {
            if self.slow.iter().any(|u| u == url) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            match self.pages.get(url) {
                Some(page) => Ok(page.clone()),
                None => Err(Error::fetch_failure(url, "connection refused")),
            }
        }
    }

    fn refs(urls: &[&str]) -> Vec<ArticleRef> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| ArticleRef {
                id: i as i64 + 1,
                url: url.to_string(),
            })
            .collect()
    }

    fn pipeline(fetcher: StubFetcher, concurrency: usize) -> PickupPipeline {
        PickupPipeline::new(
            Arc::new(fetcher),
            PipelineConfig {
                fetch_timeout: Duration::from_millis(200),
                concurrency,
            },
        )
    }

    fn lexicon() -> Lexicon {
        Lexicon::new(["太陽光発電", "PPA"], ["ENEOS", "Tesla"])
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped_and_order_kept() {
        let fetcher = StubFetcher::default()
            .page("https://a.example/1", Some("ENEOS PPA"), "太陽光発電")
            .page("https://a.example/3", Some("Tesla"), "nothing else");
        let report = pipeline(fetcher, 1)
            .run(&refs(&["https://a.example/1", "https://a.example/2", "https://a.example/3"]), &lexicon())
            .await;

        let urls: Vec<&str> = report.picked().map(|p| p.record.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/1", "https://a.example/3"]);

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0.url, "https://a.example/2");
        assert!(matches!(skipped[0].1, SkipReason::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_record_fields() {
        let fetcher = StubFetcher::default().page(
            "https://a.example/1",
            Some("ENEOS expands PPA"),
            "太陽光発電 and Tesla",
        );
        let report = pipeline(fetcher, 1).run(&refs(&["https://a.example/1"]), &lexicon()).await;
        let pickups = report.into_pickups();

        assert_eq!(pickups.len(), 1);
        let pickup = &pickups[0];
        assert_eq!(pickup.score, 1.0);
        assert_eq!(pickup.record.importance, Importance::High);
        assert_eq!(pickup.record.matched_keywords, vec!["太陽光発電", "PPA"]);
        assert_eq!(pickup.record.matched_companies, vec!["ENEOS", "Tesla"]);
        assert_eq!(pickup.record.summary, "太陽光発電 and Tesla ENEOS expands PPA");
        assert_eq!(pickup.record.title, "ENEOS expands PPA");
    }

    #[tokio::test]
    async fn test_missing_title_uses_sentinel() {
        let fetcher = StubFetcher::default().page("https://a.example/1", None, "Body only");
        let pickups = pipeline(fetcher, 1)
            .run(&refs(&["https://a.example/1"]), &lexicon())
            .await
            .into_pickups();

        assert_eq!(pickups[0].record.title, NO_TITLE);
        assert_eq!(pickups[0].record.summary, "Body only No Title");
        assert_eq!(pickups[0].record.importance, Importance::Low);
    }

    #[tokio::test]
    async fn test_empty_and_timed_out_fetches_are_skipped() {
        let fetcher = StubFetcher::default()
            .empty("https://a.example/empty")
            .page("https://a.example/slow", Some("ENEOS"), "")
            .slow("https://a.example/slow")
            .page("https://a.example/ok", Some("PPA"), "");
        let report = pipeline(fetcher, 1)
            .run(
                &refs(&["https://a.example/empty", "https://a.example/slow", "https://a.example/ok"]),
                &lexicon(),
            )
            .await;

        let reasons: Vec<&SkipReason> = report.skipped().map(|(_, reason)| reason).collect();
        assert_eq!(reasons[0], &SkipReason::EmptyContent);
        assert_eq!(reasons[1], &SkipReason::TimedOut(Duration::from_millis(200)));
        assert_eq!(report.picked().count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_keep_input_order() {
        let urls: Vec<String> = (0..8).map(|i| format!("https://a.example/{}", i)).collect();
        let mut fetcher = StubFetcher::default();
        for url in &urls {
            fetcher = fetcher.page(url, Some("PPA"), "body");
        }
        let refs: Vec<ArticleRef> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| ArticleRef { id: i as i64, url: url.clone() })
            .collect();

        let report = pipeline(fetcher, 4).run(&refs, &lexicon()).await;
        let got: Vec<String> = report.picked().map(|p| p.record.url.clone()).collect();
        assert_eq!(got, urls);
    }

    #[tokio::test]
    async fn test_content_filter_skips_rejected_articles() {
        let fetcher = StubFetcher::default()
            .page("https://a.example/1", Some("ENEOS PPA"), "太陽光発電")
            .page("https://a.example/2", Some("Tesla PPA"), "Sponsored feature")
            .page("https://a.example/3", Some("Weather"), "rain tomorrow");
        let filter = ContentFilter::new(["ppa"], ["sponsored"]);
        let report = pipeline(fetcher, 1)
            .run_filtered(
                &refs(&["https://a.example/1", "https://a.example/2", "https://a.example/3"]),
                &lexicon(),
                &filter,
            )
            .await;

        let urls: Vec<&str> = report.picked().map(|p| p.record.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/1"]);
        let reasons: Vec<&SkipReason> = report.skipped().map(|(_, reason)| reason).collect();
        assert_eq!(reasons, vec![&SkipReason::Filtered, &SkipReason::Filtered]);
    }

    #[tokio::test]
    async fn test_empty_lexicon_scores_zero() {
        let fetcher = StubFetcher::default().page("https://a.example/1", Some("ENEOS"), "PPA");
        let pickups = pipeline(fetcher, 1)
            .run(&refs(&["https://a.example/1"]), &Lexicon::default())
            .await
            .into_pickups();
        assert_eq!(pickups[0].score, 0.0);
        assert!(pickups[0].record.matched_keywords.is_empty());
    }
}
