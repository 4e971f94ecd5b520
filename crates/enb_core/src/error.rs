use std::fmt;
use thiserror::Error;

/// The registry a failing lookup or insert was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Article,
    Keyword,
    Company,
    PickupResult,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Article => "Article",
            EntryKind::Keyword => "Keyword",
            EntryKind::Company => "Company",
            EntryKind::PickupResult => "Pickup result",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} not found")]
    NotFound { kind: EntryKind, id: i64 },

    #[error("{kind} already exists")]
    DuplicateEntry { kind: EntryKind, value: String },

    #[error("Could not fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn fetch_failure(url: &str, reason: impl fmt::Display) -> Self {
        Error::FetchFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateEntry { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_messages() {
        let err = Error::NotFound { kind: EntryKind::Keyword, id: 999 };
        assert_eq!(err.to_string(), "Keyword not found");
        assert!(err.is_not_found());

        let err = Error::DuplicateEntry {
            kind: EntryKind::Company,
            value: "ENEOS".to_string(),
        };
        assert_eq!(err.to_string(), "Company already exists");
        assert!(err.is_duplicate());
    }
}
