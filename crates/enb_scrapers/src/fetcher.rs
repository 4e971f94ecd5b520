use async_trait::async_trait;
use enb_core::{ContentFetcher, Error, FetchedContent, Result};
use scraper::Html;
use std::time::Duration;
use tracing::debug;
use crate::scrapers::utils;

const USER_AGENT: &str = concat!("enb/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Fetches an article page and reduces it to a title and paragraph text.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: reqwest::Client,
}

impl HtmlFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ContentFetcher for HtmlFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch_failure(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failure(url, format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::fetch_failure(url, e))?;
        let content = parse_article(&html)?;
        debug!("Fetched {} ({} chars of body)", url, content.body.chars().count());

        Ok(Some(content).filter(|c| !c.is_empty()))
    }
}

/// Title from `og:title`, `<title>` or the first `<h1>`; body from the
/// paragraphs inside `<article>`, or every paragraph when there is none.
pub fn parse_article(html: &str) -> Result<FetchedContent> {
    let document = Html::parse_document(html);

    let og_title = utils::selector("meta[property='og:title']")?;
    let title = document
        .select(&og_title)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let title = match title {
        Some(title) => Some(title),
        None => match utils::extract_text(&document, "title")? {
            Some(title) => Some(title),
            None => utils::extract_text(&document, "h1")?,
        },
    };

    let mut paragraphs = utils::extract_texts(&document, "article p")?;
    if paragraphs.is_empty() {
        paragraphs = utils::extract_texts(&document, "p")?;
    }

    Ok(FetchedContent::new(title, paragraphs.join("\n")))
}
