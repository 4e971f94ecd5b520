use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use enb_core::config::SELF_SELECTOR;
use enb_core::scoring::NO_TITLE;
use enb_core::{DiscoveredArticle, Error, Result, SiteSelectors};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;
use super::{utils, Scraper};

/// HTML listing page scraped with per-site CSS selectors.
#[derive(Debug, Clone)]
pub struct SelectorScraper {
    name: String,
    base_url: Url,
    list_url: String,
    selectors: SiteSelectors,
    client: reqwest::Client,
}

impl SelectorScraper {
    pub fn new(
        name: String,
        base_url: &str,
        list_url: Option<String>,
        selectors: SiteSelectors,
        client: reqwest::Client,
    ) -> Result<Self> {
        let base_url = utils::parse_url(base_url)?;
        let list_url = list_url.unwrap_or_else(|| base_url.to_string());
        Ok(Self {
            name,
            base_url,
            list_url,
            selectors,
            client,
        })
    }
}

#[async_trait]
impl Scraper for SelectorScraper {
    fn source(&self) -> &str {
        &self.name
    }

    async fn discover(&self) -> Result<Vec<DiscoveredArticle>> {
        let response = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .map_err(|e| Error::fetch_failure(&self.list_url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failure(&self.list_url, format!("HTTP {}", status)));
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::fetch_failure(&self.list_url, e))?;

        let document = Html::parse_document(&html);
        extract_articles(&document, &self.base_url, &self.selectors, &self.name)
    }
}

/// `None` stands for the container element itself.
fn field_selector(selector: &str) -> Result<Option<Selector>> {
    if selector.trim() == SELF_SELECTOR {
        Ok(None)
    } else {
        utils::selector(selector).map(Some)
    }
}

fn pick<'a>(container: ElementRef<'a>, selector: &Option<Selector>) -> Option<ElementRef<'a>> {
    match selector {
        None => Some(container),
        Some(selector) => container.select(selector).next(),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One article per container match. Links resolve against `base`, non-HTTP
/// links are dropped and the first occurrence of each URL is kept.
pub fn extract_articles(
    document: &Html,
    base: &Url,
    selectors: &SiteSelectors,
    source: &str,
) -> Result<Vec<DiscoveredArticle>> {
    let container = utils::selector(&selectors.container)?;
    let title_selector = field_selector(&selectors.title)?;
    let link_selector = field_selector(&selectors.link)?;
    let date_selector = match &selectors.date {
        Some(date) => Some(field_selector(date)?),
        None => None,
    };

    let mut seen = HashSet::new();
    let mut articles = Vec::new();
    for element in document.select(&container) {
        let Some(href) = pick(element, &link_selector).and_then(|el| el.value().attr("href")) else {
            continue;
        };
        let url = match base.join(href.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
            Ok(url) => {
                debug!("Skipping non-HTTP link {}", url);
                continue;
            }
            Err(e) => {
                debug!("Skipping unresolvable link {}: {}", href, e);
                continue;
            }
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = pick(element, &title_selector)
            .map(|el| utils::element_text(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let published_at = date_selector.as_ref().and_then(|selector| {
            let el = pick(element, selector)?;
            let raw = el
                .value()
                .attr("datetime")
                .map(str::to_string)
                .unwrap_or_else(|| utils::element_text(&el));
            parse_date(&raw)
        });

        articles.push(DiscoveredArticle {
            title,
            url,
            source: source.to_string(),
            published_at,
        });
    }
    Ok(articles)
}
