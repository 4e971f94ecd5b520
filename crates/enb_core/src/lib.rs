pub mod collaborators;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod logging;
pub mod scoring;
pub mod storage;
pub mod types;

pub use collaborators::{ContentFetcher, Notifier};
pub use config::{Config, SiteSelectors, SourceConfig, StorageSettings};
pub use error::{EntryKind, Error, Result};
pub use lexicon::{Lexicon, SeedPolicy};
pub use storage::{ArticleRegistry, LexiconStorage, PickupStorage, Storage};
pub use types::{
    ArticleRef, Company, DiscoveredArticle, FetchedContent, Importance, Keyword, PickupRecord,
    RelevanceScore, ScoredPickup,
};
