use async_trait::async_trait;
use chrono::Utc;
use enb_core::{DiscoveredArticle, Error, Result};
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;
use super::Scraper;

const UNTITLED: &str = "Untitled";

/// RSS or Atom feed source.
#[derive(Debug, Clone)]
pub struct RssScraper {
    name: String,
    feed_url: String,
    client: reqwest::Client,
}

impl RssScraper {
    pub fn new(name: String, feed_url: String, client: reqwest::Client) -> Self {
        Self {
            name,
            feed_url,
            client,
        }
    }
}

#[async_trait]
impl Scraper for RssScraper {
    fn source(&self) -> &str {
        &self.name
    }

    async fn discover(&self) -> Result<Vec<DiscoveredArticle>> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| Error::fetch_failure(&self.feed_url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failure(&self.feed_url, format!("HTTP {}", status)));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch_failure(&self.feed_url, e))?;

        parse_feed(&body, &self.name)
    }
}

/// Entries with a link, in feed order, first occurrence of each URL kept.
pub fn parse_feed(content: &[u8], source: &str) -> Result<Vec<DiscoveredArticle>> {
    let feed = parser::parse(content)
        .map_err(|e| Error::Scraping(format!("Failed to parse feed: {}", e)))?;

    let mut seen = HashSet::new();
    let mut articles = Vec::new();
    for entry in feed.entries {
        let Some(link) = entry.links.first() else {
            debug!("Skipping feed entry {} without a link", entry.id);
            continue;
        };
        let url = link.href.trim().to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        articles.push(DiscoveredArticle {
            title,
            url,
            source: source.to_string(),
            published_at,
        });
    }
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Energy News</title>
    <link>https://news.example.com</link>
    <description>Energy industry news</description>
    <item>
      <title>出光興産、太陽光発電のPPAを拡大</title>
      <link>https://news.example.com/articles/1</link>
      <pubDate>Tue, 01 Oct 2024 09:00:00 +0900</pubDate>
    </item>
    <item>
      <title>Duplicate</title>
      <link>https://news.example.com/articles/1</link>
    </item>
    <item>
      <title></title>
      <link>https://news.example.com/articles/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let articles = parse_feed(FEED.as_bytes(), "Energy News").unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "出光興産、太陽光発電のPPAを拡大");
        assert_eq!(articles[0].url, "https://news.example.com/articles/1");
        assert_eq!(articles[0].source, "Energy News");
        assert_eq!(
            articles[0].published_at.unwrap().to_rfc3339(),
            "2024-10-01T00:00:00+00:00"
        );
        assert_eq!(articles[1].title, UNTITLED);
        assert!(articles[1].published_at.is_none());
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(b"this is not a feed", "x").is_err());
    }

    #[tokio::test]
    async fn test_discover_fetches_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let scraper = RssScraper::new(
            "Energy News".to_string(),
            format!("{}/feed.xml", server.uri()),
            reqwest::Client::new(),
        );
        let articles = scraper.discover().await.unwrap();
        assert_eq!(articles.len(), 2);
    }
}
