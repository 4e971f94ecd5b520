use enb_core::logging::Logger;
use enb_core::{ArticleRegistry, Config, DiscoveredArticle, Result};
use tracing::info;
use crate::fetcher::build_client;
use crate::scrapers::{build_scraper, Scraper};

type BoxedScraper = Box<dyn Scraper>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub discovered: usize,
    pub registered: usize,
}

/// Walks every configured source and gathers its current article links.
pub struct NewsCollector {
    scrapers: Vec<BoxedScraper>,
    max_articles_per_source: usize,
    logger: Logger,
}

impl NewsCollector {
    pub fn new(max_articles_per_source: usize) -> Self {
        Self {
            scrapers: Vec::new(),
            max_articles_per_source,
            logger: Logger::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_client(config.fetch_timeout())?;
        let mut collector = Self::new(config.max_articles_per_source);
        for source in &config.sources {
            collector.add_scraper(build_scraper(source, client.clone())?);
        }
        Ok(collector)
    }

    pub fn add_scraper(&mut self, scraper: BoxedScraper) {
        self.scrapers.push(scraper);
    }

    pub fn sources(&self) -> Vec<&str> {
        self.scrapers.iter().map(|s| s.source()).collect()
    }

    /// Sources are visited in order. A failing source is logged and skipped.
    pub async fn collect(&self) -> Vec<DiscoveredArticle> {
        let mut collected = Vec::new();
        for scraper in &self.scrapers {
            let logger = self.logger.clone().with_prefix(format!("[{}]", scraper.source()));
            logger.info("🔍 Collecting news");
            match scraper.discover().await {
                Ok(mut articles) => {
                    if articles.len() > self.max_articles_per_source {
                        logger.debug(&format!(
                            "Keeping {} of {} articles",
                            self.max_articles_per_source,
                            articles.len()
                        ));
                        articles.truncate(self.max_articles_per_source);
                    }
                    logger.info(&format!("📰 Found {} articles", articles.len()));
                    collected.extend(articles);
                }
                Err(e) => logger.error(&format!("❌ Error collecting news: {}", e)),
            }
        }
        collected
    }

    /// Collect, then register every discovered URL that is not known yet.
    pub async fn collect_and_register<R>(
        &self,
        registry: &R,
    ) -> Result<(Vec<DiscoveredArticle>, CollectionReport)>
    where
        R: ArticleRegistry + ?Sized,
    {
        let articles = self.collect().await;
        let urls: Vec<String> = articles.iter().map(|a| a.url.clone()).collect();
        let registered = registry.add_articles_ignoring_duplicates(&urls).await?;
        info!(
            "✅ Collected {} articles from {} sources, {} new",
            articles.len(),
            self.scrapers.len(),
            registered
        );
        let report = CollectionReport {
            discovered: articles.len(),
            registered,
        };
        Ok((articles, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use enb_core::Error;
    use enb_storage::InMemoryStorage;

    struct FixedSource {
        name: &'static str,
        count: usize,
    }

    #[async_trait]
    impl Scraper for FixedSource {
        fn source(&self) -> &str {
            self.name
        }

        async fn discover(&self) -> Result<Vec<DiscoveredArticle>> {
            Ok((0..self.count)
                .map(|i| DiscoveredArticle {
                    title: format!("{} {}", self.name, i),
                    url: format!("https://{}.example.com/{}", self.name, i),
                    source: self.name.to_string(),
                    published_at: None,
                })
                .collect())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl Scraper for BrokenSource {
        fn source(&self) -> &str {
            "broken"
        }

        async fn discover(&self) -> Result<Vec<DiscoveredArticle>> {
            Err(Error::fetch_failure("https://broken.example.com", "HTTP 500"))
        }
    }

    fn collector() -> NewsCollector {
        let mut collector = NewsCollector::new(3);
        collector.add_scraper(Box::new(FixedSource { name: "alpha", count: 5 }));
        collector.add_scraper(Box::new(BrokenSource));
        collector.add_scraper(Box::new(FixedSource { name: "beta", count: 2 }));
        collector
    }

    #[tokio::test]
    async fn test_collect_skips_failing_sources_and_caps_per_source() {
        let articles = collector().collect().await;
        let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://alpha.example.com/0",
                "https://alpha.example.com/1",
                "https://alpha.example.com/2",
                "https://beta.example.com/0",
                "https://beta.example.com/1",
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_and_register_is_insert_or_ignore() {
        let collector = collector();
        let storage = InMemoryStorage::new();

        let (_, first) = collector.collect_and_register(&storage).await.unwrap();
        assert_eq!(first, CollectionReport { discovered: 5, registered: 5 });

        let (_, second) = collector.collect_and_register(&storage).await.unwrap();
        assert_eq!(second, CollectionReport { discovered: 5, registered: 0 });
        assert_eq!(storage.list_articles().await.unwrap().len(), 5);
    }

    #[test]
    fn test_from_config_lists_sources() {
        let mut config = Config::default();
        config.sources.push(enb_core::SourceConfig::Rss {
            name: "Denki Shimbun".to_string(),
            feed_url: "https://example.com/rss".to_string(),
        });
        let collector = NewsCollector::from_config(&config).unwrap();
        assert_eq!(collector.sources(), vec!["Denki Shimbun"]);
    }
}
