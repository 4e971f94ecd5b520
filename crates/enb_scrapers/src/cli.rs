use clap::{Args, Subcommand};
use enb_core::{ArticleRegistry, Config, ContentFetcher, DiscoveredArticle, Result};
use crate::collector::NewsCollector;
use crate::fetcher::HtmlFetcher;

#[derive(Args, Debug)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug)]
pub enum ScraperCommands {
    /// Collect article links from every configured source
    Collect {
        /// Register the collected URLs as articles
        #[arg(long)]
        register: bool,
    },
    /// List configured sources
    List,
    /// Fetch one article page and show what would be scored
    Fetch {
        url: String,
    },
}

fn discovered_line(article: &DiscoveredArticle) -> String {
    match article.published_at {
        Some(date) => format!(
            "[{}] {} {} - {}",
            article.source,
            date.format("%Y-%m-%d"),
            article.title,
            article.url
        ),
        None => format!("[{}] {} - {}", article.source, article.title, article.url),
    }
}

pub async fn handle_command<R>(args: ScraperArgs, config: &Config, registry: &R) -> Result<()>
where
    R: ArticleRegistry + ?Sized,
{
    match args.command {
        ScraperCommands::Collect { register } => {
            let collector = NewsCollector::from_config(config)?;
            let articles = if register {
                let (articles, report) = collector.collect_and_register(registry).await?;
                println!("Registered {} new articles", report.registered);
                articles
            } else {
                collector.collect().await
            };
            println!("Found {} articles", articles.len());
            for article in &articles {
                println!("🆕 {}", discovered_line(article));
            }
        }
        ScraperCommands::List => {
            if config.sources.is_empty() {
                println!("No sources configured");
            }
            for source in &config.sources {
                println!("  {}", source.name());
            }
        }
        ScraperCommands::Fetch { url } => {
            let fetcher = HtmlFetcher::new(config.fetch_timeout())?;
            match fetcher.fetch(&url).await? {
                Some(content) => {
                    println!("{}", content.title.as_deref().unwrap_or(enb_core::scoring::NO_TITLE));
                    println!();
                    println!("{}", content.body);
                }
                None => println!("⏭️ No usable content at {}", url),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScraperArgs,
    }

    #[test]
    fn test_parse_collect_with_register() {
        let cli = TestCli::try_parse_from(["enb", "collect", "--register"]).unwrap();
        assert!(matches!(cli.args.command, ScraperCommands::Collect { register: true }));
    }

    #[test]
    fn test_parse_fetch() {
        let cli = TestCli::try_parse_from(["enb", "fetch", "https://example.com/a"]).unwrap();
        match cli.args.command {
            ScraperCommands::Fetch { url } => assert_eq!(url, "https://example.com/a"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_discovered_line_shows_publication_date() {
        use chrono::{TimeZone, Utc};

        let mut article = DiscoveredArticle {
            title: "洋上風力 第3ラウンド".to_string(),
            url: "https://example.com/news/1".to_string(),
            source: "Denki".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap()),
        };
        assert_eq!(
            discovered_line(&article),
            "[Denki] 2024-03-05 洋上風力 第3ラウンド - https://example.com/news/1"
        );

        article.published_at = None;
        assert_eq!(discovered_line(&article), "[Denki] 洋上風力 第3ラウンド - https://example.com/news/1");
    }

    #[tokio::test]
    async fn test_list_without_sources() {
        let storage = enb_storage::InMemoryStorage::new();
        let args = ScraperArgs {
            command: ScraperCommands::List,
        };
        handle_command(args, &Config::default(), &storage).await.unwrap();
    }
}
