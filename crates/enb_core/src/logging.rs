use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "energy_news_bot.log";

/// Prefixing wrapper around the `tracing` macros, e.g. `[RSS:Denki Shimbun] found 12 links`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

fn file_appender(log_dir: &Path) -> io::Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)?;
    Ok(rolling::never(log_dir, LOG_FILE_NAME))
}

/// Installs the global subscriber: stdout, plus `<log_dir>/energy_news_bot.log`
/// when a directory is given. `RUST_LOG` wins over `default_directive`.
///
/// Returns `None` when a subscriber was already installed. Keep the guard
/// alive for as long as file output should be flushed.
pub fn init_logging(default_directive: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let (file_writer, guard) = match log_dir.map(file_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Could not open log directory, logging to stdout only: {}", e);
            (None, None)
        }
        None => (None, None),
    };
    let file_layer = file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .ok()?;
    guard
}
