use clap::{Parser, Subcommand};
use enb_core::config::DEFAULT_NOTIFY_THRESHOLD;
use enb_core::logging::init_logging;
use enb_core::{Config, Error, Result};
use enb_pickup::PickupService;
use enb_scrapers::ScraperArgs;
use enb_web::AppState;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| "Duration is too large".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(num)
                .ok_or_else(|| "Duration is too large".to_string())?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Energy news relevance scoring and pickup", long_about = None)]
struct Cli {
    /// JSON configuration file. Defaults are used when it does not exist.
    #[arg(long, env = "ENB_CONFIG", default_value = "config.json", global = true)]
    config: PathBuf,
    #[arg(long, default_value = "sqlite", global = true, help = "Storage backend: memory, sqlite")]
    storage: String,
    /// SQLite database location, tried before the default candidates
    #[arg(long, env = "DB_PATH", global = true)]
    db_path: Option<PathBuf>,
    /// Leave empty keyword, company and pickup tables unseeded
    #[arg(
        long,
        env = "DISABLE_SEEDING",
        global = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    disable_seeding: bool,
    /// Also write logs to energy_news_bot.log in this directory
    #[arg(long, env = "ENB_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, env = "TEAMS_WEBHOOK_URL", global = true)]
    webhook_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
    },
    /// Manage registered article URLs
    Articles {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Manage match keywords
    Keywords {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Manage match companies
    Companies {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Score one registered article against the current lexicon
    Relevance { id: i64 },
    /// Run the pickup pipeline over every registered article
    Run {
        /// Store the produced records in the persisted pickup table
        #[arg(long)]
        persist: bool,
    },
    /// Post articles scoring at or above the threshold to Teams
    PostHighRelevance {
        #[arg(long, default_value_t = DEFAULT_NOTIFY_THRESHOLD)]
        threshold: f64,
    },
    /// Show pickup results
    Pickup {
        #[command(subcommand)]
        command: PickupCommands,
    },
    /// Collect, register, score and post in one pass
    Process {
        /// Repeat with this interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
        /// Repeat with the configured update interval
        #[arg(long, conflicts_with = "interval")]
        periodic: bool,
    },
    /// Source discovery commands
    Scrape(ScraperArgs),
}

#[derive(Subcommand, Debug)]
enum RegistryCommands {
    Add { value: String },
    List,
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PickupCommands {
    /// Compute results now from the registered articles
    Live,
    /// Read the persisted results
    Stored,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match Config::load_from_file(&cli.config) {
        Ok(config) => {
            info!("⚙️ Loaded configuration from {}", cli.config.display());
            config
        }
        Err(Error::ConfigurationMissing(reason)) => {
            warn!("⚠️ {}, using defaults", reason);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(db_path) = &cli.db_path {
        config.storage.db_path = Some(db_path.clone());
    }
    if cli.disable_seeding {
        config.storage.disable_seeding = true;
    }
    if let Some(url) = &cli.webhook_url {
        config.teams_webhook_url = Some(url.clone());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_process(service: &PickupService, interval: Option<Duration>) -> Result<()> {
    let Some(interval) = interval else {
        return print_json(&service.process_articles().await?);
    };

    info!("⏰ Running in periodic mode every {}s", interval.as_secs());
    loop {
        info!("Starting processing cycle");
        match service.process_articles().await {
            Ok(report) => info!("✨ {}", report.message),
            Err(e) => error!("❌ Error during processing: {}", e),
        }
        info!("Waiting {}s before next cycle", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let _log_guard = init_logging("info", cli.log_dir.as_deref());

    let config = load_config(&cli)?;
    let storage = enb_storage::create_storage(&cli.storage, &config.storage).await?;
    info!("💾 Storage initialized successfully (using {})", storage.backend_name());

    let service = PickupService::from_config(storage.clone(), config.clone())?;

    match cli.command {
        Commands::Serve { addr } => {
            enb_web::serve(addr, AppState::new(service)).await?;
        }
        Commands::Articles { command } => match command {
            RegistryCommands::Add { value } => print_json(&service.add_article(&value).await?)?,
            RegistryCommands::List => print_json(&service.list_articles().await?)?,
            RegistryCommands::Delete { id } => {
                service.delete_article(id).await?;
                println!("Article deleted successfully");
            }
        },
        Commands::Keywords { command } => match command {
            RegistryCommands::Add { value } => print_json(&service.add_keyword(&value).await?)?,
            RegistryCommands::List => print_json(&service.list_keywords().await?)?,
            RegistryCommands::Delete { id } => {
                service.delete_keyword(id).await?;
                println!("Keyword deleted successfully");
            }
        },
        Commands::Companies { command } => match command {
            RegistryCommands::Add { value } => print_json(&service.add_company(&value).await?)?,
            RegistryCommands::List => print_json(&service.list_companies().await?)?,
            RegistryCommands::Delete { id } => {
                service.delete_company(id).await?;
                println!("Company deleted successfully");
            }
        },
        Commands::Relevance { id } => print_json(&service.article_relevance(id).await?)?,
        Commands::Run { persist } => {
            let report = service.run_pipeline(persist).await?;
            for (article, reason) in report.skipped() {
                println!("⏭️ {} ({})", article.url, reason);
            }
            print_json(&report.records())?;
        }
        Commands::PostHighRelevance { threshold } => {
            print_json(&service.post_high_relevance(threshold).await?)?
        }
        Commands::Pickup { command } => match command {
            PickupCommands::Live => print_json(&service.live_pickup_results().await?)?,
            PickupCommands::Stored => print_json(&service.stored_pickup_results().await?)?,
        },
        Commands::Process { interval, periodic } => {
            let interval = match (interval, periodic) {
                (Some(interval), _) => Some(interval.0),
                (None, true) => Some(config.update_interval()?),
                (None, false) => None,
            };
            run_process(&service, interval).await?;
        }
        Commands::Scrape(args) => {
            enb_scrapers::handle_command(args, &config, storage.as_ref()).await?;
        }
    }

    Ok(())
}
