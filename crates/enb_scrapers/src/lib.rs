pub mod cli;
pub mod collector;
pub mod fetcher;
pub mod scrapers;

pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use collector::NewsCollector;
pub use fetcher::HtmlFetcher;
pub use scrapers::{build_scraper, RssScraper, Scraper, SelectorScraper};

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use enb_core::{DiscoveredArticle, Error, Result};
}
