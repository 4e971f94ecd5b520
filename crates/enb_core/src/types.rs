use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered article URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// Normalized page content produced by a single fetch attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedContent {
    pub title: Option<String>,
    pub body: String,
}

impl FetchedContent {
    pub fn new(title: Option<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.filter(|t| !t.trim().is_empty()),
            body: body.into(),
        }
    }

    /// True when there is neither a title nor any body text to score.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "High",
            Importance::Medium => "Medium",
            Importance::Low => "Low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Importance {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "High" => Ok(Importance::High),
            "Medium" => Ok(Importance::Medium),
            "Low" => Ok(Importance::Low),
            other => Err(crate::Error::Database(format!("Unknown importance: {}", other))),
        }
    }
}

/// A scored, classified and summarized article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRecord {
    pub title: String,
    pub matched_keywords: Vec<String>,
    pub matched_companies: Vec<String>,
    pub importance: Importance,
    pub summary: String,
    pub url: String,
}

/// A pickup record together with the score it was classified from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPickup {
    pub score: f64,
    #[serde(flatten)]
    pub record: PickupRecord,
}

/// Result of the on-demand relevance check for one registered article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub article_url: String,
    pub score: f64,
    pub matching_keywords: Vec<String>,
    pub matching_companies: Vec<String>,
}

/// An article link found on a configured news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}
