use enb_core::{
    ArticleRef, ArticleRegistry, Company, Config, ContentFetcher, Error, Keyword, LexiconStorage,
    Notifier, PickupRecord, PickupStorage, Result, RelevanceScore, Storage,
};
use enb_scrapers::{HtmlFetcher, NewsCollector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::gate::{NotificationGate, DEFAULT_PAUSE, DEFAULT_PAUSE_EVERY};
use crate::pipeline::{PickupPipeline, PickupReport, PipelineConfig};
use crate::teams::TeamsNotifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRelevanceReport {
    pub message: String,
    pub threshold: f64,
    pub articles_posted: usize,
    pub total_high_relevance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub collected_articles: usize,
    pub processed_articles: usize,
    pub posted_to_teams: usize,
    pub message: String,
}

/// Every operation exposed to the HTTP and command-line surfaces.
pub struct PickupService {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn ContentFetcher>,
    pipeline: PickupPipeline,
    collector: Option<NewsCollector>,
    notifier: Option<Arc<dyn Notifier>>,
    pause_every: usize,
    pause: Duration,
    config: Config,
}

impl PickupService {
    pub fn new(storage: Arc<dyn Storage>, fetcher: Arc<dyn ContentFetcher>, config: Config) -> Self {
        let pipeline = PickupPipeline::new(
            fetcher.clone(),
            PipelineConfig {
                fetch_timeout: config.fetch_timeout(),
                concurrency: config.fetch_concurrency,
            },
        );
        Self {
            storage,
            fetcher,
            pipeline,
            collector: None,
            notifier: None,
            pause_every: DEFAULT_PAUSE_EVERY,
            pause: DEFAULT_PAUSE,
            config,
        }
    }

    /// HTML fetcher, configured sources and, when a webhook is set, Teams delivery.
    pub fn from_config(storage: Arc<dyn Storage>, config: Config) -> Result<Self> {
        let fetcher = Arc::new(HtmlFetcher::new(config.fetch_timeout())?);
        let collector = NewsCollector::from_config(&config)?;
        let notifier = match config.webhook_url() {
            Ok(url) => Some(Arc::new(TeamsNotifier::new(url)?) as Arc<dyn Notifier>),
            Err(_) => None,
        };

        let mut service = Self::new(storage, fetcher, config).with_collector(collector);
        if let Some(notifier) = notifier {
            service = service.with_notifier(notifier);
        }
        Ok(service)
    }

    pub fn with_collector(mut self, collector: NewsCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_rate_limit(mut self, pause_every: usize, pause: Duration) -> Self {
        self.pause_every = pause_every;
        self.pause = pause;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    fn gate(&self) -> Option<NotificationGate> {
        self.notifier
            .clone()
            .map(|n| NotificationGate::new(n).with_rate_limit(self.pause_every, self.pause))
    }

    pub async fn add_article(&self, url: &str) -> Result<ArticleRef> {
        self.storage.add_article(url).await
    }

    pub async fn list_articles(&self) -> Result<Vec<ArticleRef>> {
        self.storage.list_articles().await
    }

    pub async fn delete_article(&self, id: i64) -> Result<()> {
        self.storage.delete_article(id).await
    }

    pub async fn add_keyword(&self, word: &str) -> Result<Keyword> {
        self.storage.add_keyword(word).await
    }

    pub async fn list_keywords(&self) -> Result<Vec<Keyword>> {
        self.storage.list_keywords().await
    }

    pub async fn delete_keyword(&self, id: i64) -> Result<()> {
        self.storage.delete_keyword(id).await
    }

    pub async fn add_company(&self, name: &str) -> Result<Company> {
        self.storage.add_company(name).await
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        self.storage.list_companies().await
    }

    pub async fn delete_company(&self, id: i64) -> Result<()> {
        self.storage.delete_company(id).await
    }

    /// Score one registered article against the current lexicon.
    pub async fn article_relevance(&self, id: i64) -> Result<RelevanceScore> {
        let article = self.storage.get_article(id).await?;
        let lexicon = self.storage.lexicon().await?;

        let fetched = tokio::time::timeout(self.config.fetch_timeout(), self.fetcher.fetch(&article.url))
            .await
            .map_err(|_| Error::fetch_failure(&article.url, "timed out"))??;
        let content = fetched
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::fetch_failure(&article.url, "no usable content"))?;

        let title = content.title.unwrap_or_default();
        let relevance = enb_core::scoring::score(&content.body, &title, &lexicon);
        Ok(RelevanceScore {
            article_url: article.url,
            score: relevance.score,
            matching_keywords: relevance.matched_keywords,
            matching_companies: relevance.matched_companies,
        })
    }

    /// Run the pipeline over every registered article. With `persist`, the
    /// records are upserted into the stored pickup table by URL.
    pub async fn run_pipeline(&self, persist: bool) -> Result<PickupReport> {
        let articles = self.storage.list_articles().await?;
        let lexicon = self.storage.lexicon().await?;
        info!("🚀 Running pickup over {} articles", articles.len());

        let report = self.pipeline.run(&articles, &lexicon).await;
        if persist {
            let mut stored = 0;
            for pickup in report.picked() {
                self.storage.upsert_pickup_record(&pickup.record).await?;
                stored += 1;
            }
            info!("💾 Stored {} pickup results", stored);
        }
        Ok(report)
    }

    /// Computed now from the registered articles. Never stored.
    pub async fn live_pickup_results(&self) -> Result<Vec<PickupRecord>> {
        Ok(self.run_pipeline(false).await?.records())
    }

    /// Read back verbatim from the stored pickup table. Never recomputed.
    pub async fn stored_pickup_results(&self) -> Result<Vec<PickupRecord>> {
        self.storage.list_pickup_records().await
    }

    pub async fn post_high_relevance(&self, threshold: f64) -> Result<HighRelevanceReport> {
        let gate = self
            .gate()
            .ok_or_else(|| Error::ConfigurationMissing("teams_webhook_url".to_string()))?;

        let pickups = self.run_pipeline(false).await?.into_pickups();
        let outcome = gate
            .select_and_send(&pickups, threshold, self.config.max_teams_posts)
            .await;

        Ok(HighRelevanceReport {
            message: format!("Posted {} high-relevance articles to Teams", outcome.forwarded),
            threshold,
            articles_posted: outcome.forwarded,
            total_high_relevance: outcome.eligible,
        })
    }

    /// Collect from the configured sources, register new links, score every
    /// registered article and forward the relevant ones.
    pub async fn process_articles(&self) -> Result<ProcessingReport> {
        let collected = match &self.collector {
            Some(collector) => collector.collect_and_register(self.storage.as_ref()).await?.1.discovered,
            None => 0,
        };

        let articles = self.storage.list_articles().await?;
        let lexicon = self.storage.lexicon().await?;
        let pickups = self
            .pipeline
            .run_filtered(&articles, &lexicon, &self.config.content_filter())
            .await
            .into_pickups();
        let posted = match self.gate() {
            Some(gate) => {
                gate.select_and_send(&pickups, self.config.notify_threshold, self.config.max_teams_posts)
                    .await
                    .forwarded
            }
            None => {
                warn!("⚠️ No Teams webhook configured, nothing posted");
                0
            }
        };

        Ok(ProcessingReport {
            collected_articles: collected,
            processed_articles: pickups.len(),
            posted_to_teams: posted,
            message: format!(
                "Successfully processed {} articles, {} passed filtering, {} posted to Teams",
                collected,
                pickups.len(),
                posted
            ),
        })
    }
}
