//! Relevance scoring, importance tiers and summary truncation.
//!
//! Matching is plain case-sensitive substring containment: no normalization,
//! stemming or case folding is applied.

use crate::lexicon::Lexicon;
use crate::types::Importance;

pub const SUMMARY_MAX_CHARS: usize = 300;
pub const TRUNCATION_MARKER: &str = "...";
pub const NO_TITLE: &str = "No Title";

const HIGH_THRESHOLD: f64 = 0.8;
const MEDIUM_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Relevance {
    pub score: f64,
    pub matched_keywords: Vec<String>,
    pub matched_companies: Vec<String>,
}

/// Scores `content` and `title` against the lexicon.
pub fn score(content: &str, title: &str, lexicon: &Lexicon) -> Relevance {
    let text = format!("{} {}", content, title);

    let matched_keywords = matches_in(&text, lexicon.keywords());
    let matched_companies = matches_in(&text, lexicon.companies());

    let total_possible = lexicon.len();
    let score = if total_possible > 0 {
        (matched_keywords.len() + matched_companies.len()) as f64 / total_possible as f64
    } else {
        0.0
    };

    Relevance {
        score,
        matched_keywords,
        matched_companies,
    }
}

fn matches_in(text: &str, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|term| text.contains(term.as_str()))
        .cloned()
        .collect()
}

/// Boundary values fall into the lower tier.
pub fn classify(score: f64) -> Importance {
    if score > HIGH_THRESHOLD {
        Importance::High
    } else if score > MEDIUM_THRESHOLD {
        Importance::Medium
    } else {
        Importance::Low
    }
}

/// Truncates to `SUMMARY_MAX_CHARS` characters, appending the marker when cut.
pub fn truncate(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Summary of the scored text, falling back to the title when the text is blank.
pub fn summarize(text: &str, title: &str) -> String {
    let summary = truncate(text);
    if summary.trim().is_empty() {
        truncate(title)
    } else {
        summary
    }
}

/// Case-insensitive include/exclude gate over an article's title and body.
///
/// With include terms, at least one must appear. Any exclude term rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl ContentFilter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let lower = |term: &str| term.to_lowercase();
        Self {
            include: include.into_iter().map(|t| lower(t.as_ref())).collect(),
            exclude: exclude.into_iter().map(|t| lower(t.as_ref())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn allows(&self, title: &str, body: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let text = format!("{} {}", title, body).to_lowercase();
        let included = self.include.is_empty() || self.include.iter().any(|t| text.contains(t.as_str()));
        included && !self.exclude.iter().any(|t| text.contains(t.as_str()))
    }
}
