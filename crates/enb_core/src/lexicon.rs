use std::collections::HashSet;
use crate::types::{Company, Importance, Keyword, PickupRecord};

pub const STARTER_KEYWORDS: &[&str] = &["太陽光発電", "CPPA", "PPA", "系統用蓄電池"];
pub const STARTER_COMPANIES: &[&str] = &["Tesla", "出光興産", "ENEOS"];

/// Whether empty registries get the starter set on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    #[default]
    SeedOnEmpty,
    Disabled,
}

impl SeedPolicy {
    pub fn from_disable_flag(disable_seeding: bool) -> Self {
        if disable_seeding {
            SeedPolicy::Disabled
        } else {
            SeedPolicy::SeedOnEmpty
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SeedPolicy::SeedOnEmpty)
    }
}

/// Rows written to an empty persisted pickup table.
pub fn starter_pickup_records() -> Vec<PickupRecord> {
    vec![
        PickupRecord {
            title: "ENEOS、系統用蓄電池事業に本格参入".to_string(),
            matched_keywords: vec!["系統用蓄電池".to_string()],
            matched_companies: vec!["ENEOS".to_string()],
            importance: Importance::Medium,
            summary: "ENEOSは系統用蓄電池の運用を開始し、需給調整市場への参入を進める。".to_string(),
            url: "https://example.com/news/eneos-grid-battery".to_string(),
        },
        PickupRecord {
            title: "出光興産、オフサイトPPAで太陽光発電の供給を拡大".to_string(),
            matched_keywords: vec!["太陽光発電".to_string(), "PPA".to_string()],
            matched_companies: vec!["出光興産".to_string()],
            importance: Importance::High,
            summary: "出光興産はオフサイトPPAを通じて法人向けに太陽光発電由来の電力を供給する。".to_string(),
            url: "https://example.com/news/idemitsu-offsite-ppa".to_string(),
        },
        PickupRecord {
            title: "Tesla expands Megapack deployments in Japan".to_string(),
            matched_keywords: vec![],
            matched_companies: vec!["Tesla".to_string()],
            importance: Importance::Low,
            summary: "Tesla announced new utility-scale storage projects.".to_string(),
            url: "https://example.com/news/tesla-megapack-japan".to_string(),
        },
    ]
}

/// Snapshot of the keyword and company match targets.
///
/// Enumeration order follows the order the entries were read from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    keywords: Vec<String>,
    companies: Vec<String>,
}

impl Lexicon {
    pub fn new<K, C>(keywords: K, companies: C) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            keywords: dedup(keywords),
            companies: dedup(companies),
        }
    }

    pub fn from_entries(keywords: &[Keyword], companies: &[Company]) -> Self {
        Self::new(
            keywords.iter().map(|k| k.word.clone()),
            companies.iter().map(|c| c.name.clone()),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn companies(&self) -> &[String] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.keywords.len() + self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dedup<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
