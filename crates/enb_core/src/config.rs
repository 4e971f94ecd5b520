use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::lexicon::SeedPolicy;
use crate::scoring::ContentFilter;
use crate::{Error, Result};

/// Selector value meaning "the container element itself".
pub const SELF_SELECTOR: &str = "self";

pub const DEFAULT_NOTIFY_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// One match per listed article.
    pub container: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Rss {
        name: String,
        feed_url: String,
    },
    Html {
        name: String,
        base_url: String,
        #[serde(default)]
        list_url: Option<String>,
        selectors: SiteSelectors,
    },
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Rss { name, .. } => name,
            SourceConfig::Html { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Explicit database location. Tried before `candidates`.
    pub db_path: Option<PathBuf>,
    pub candidates: Vec<PathBuf>,
    pub disable_seeding: bool,
}

impl StorageSettings {
    pub fn seed_policy(&self) -> SeedPolicy {
        SeedPolicy::from_disable_flag(self.disable_seeding)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    pub teams_webhook_url: Option<String>,
    pub max_articles_per_source: usize,
    pub max_teams_posts: usize,
    pub update_interval_hours: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub notify_threshold: f64,
    /// When non-empty, processed articles must mention one of these.
    pub keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub storage: StorageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            teams_webhook_url: None,
            max_articles_per_source: 10,
            max_teams_posts: 10,
            update_interval_hours: 1,
            fetch_timeout_secs: 10,
            fetch_concurrency: 1,
            notify_threshold: DEFAULT_NOTIFY_THRESHOLD,
            keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            storage: StorageSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigurationMissing(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn update_interval(&self) -> Result<Duration> {
        self.update_interval_hours
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "update_interval_hours is too large: {}",
                    self.update_interval_hours
                ))
            })
    }

    pub fn content_filter(&self) -> ContentFilter {
        ContentFilter::new(&self.keywords, &self.exclude_keywords)
    }

    pub fn webhook_url(&self) -> Result<&str> {
        self.teams_webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::ConfigurationMissing("teams_webhook_url".to_string()))
    }
}
