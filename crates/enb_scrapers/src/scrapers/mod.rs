use async_trait::async_trait;
use enb_core::{DiscoveredArticle, Result, SourceConfig};

pub mod rss;
pub mod selector;

pub use rss::RssScraper;
pub use selector::SelectorScraper;

/// A configured news source that can list its current articles.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the name of the news source
    fn source(&self) -> &str;

    /// Returns the articles currently listed by the source, in listing order
    async fn discover(&self) -> Result<Vec<DiscoveredArticle>>;
}

pub fn build_scraper(config: &SourceConfig, client: reqwest::Client) -> Result<Box<dyn Scraper>> {
    let scraper: Box<dyn Scraper> = match config {
        SourceConfig::Rss { name, feed_url } => {
            Box::new(RssScraper::new(name.clone(), feed_url.clone(), client))
        }
        SourceConfig::Html {
            name,
            base_url,
            list_url,
            selectors,
        } => Box::new(SelectorScraper::new(
            name.clone(),
            base_url,
            list_url.clone(),
            selectors.clone(),
            client,
        )?),
    };
    Ok(scraper)
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use enb_core::{Error, Result};
    use scraper::{ElementRef, Html, Selector};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    pub fn selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector)
            .map_err(|e| Error::Scraping(format!("Invalid selector '{}': {}", selector, e)))
    }

    /// Text of an element with runs of whitespace collapsed.
    pub fn element_text(element: &ElementRef<'_>) -> String {
        let text: String = element.text().collect();
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn extract_text(document: &Html, selector: &str) -> Result<Option<String>> {
        let selector = self::selector(selector)?;
        Ok(document
            .select(&selector)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty()))
    }

    pub fn extract_texts(document: &Html, selector: &str) -> Result<Vec<String>> {
        let selector = self::selector(selector)?;
        Ok(document
            .select(&selector)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect())
    }
}
