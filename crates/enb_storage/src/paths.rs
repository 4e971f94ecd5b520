use enb_core::{Error, Result, StorageSettings};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locations tried in order when no explicit database path is configured.
pub const DEFAULT_DB_CANDIDATES: &[&str] = &["/var/data/news.db", "data/news.db", "news.db"];

/// The explicit path, then the configured candidates, then the defaults.
pub fn candidate_paths(settings: &StorageSettings) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = &settings.db_path {
        paths.push(path.clone());
    }
    paths.extend(settings.candidates.iter().cloned());
    paths.extend(DEFAULT_DB_CANDIDATES.iter().map(PathBuf::from));
    paths
}

fn is_writable(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

/// First candidate whose directory can be created and whose file can be opened for writing.
pub fn resolve_db_path(candidates: &[PathBuf]) -> Result<PathBuf> {
    for candidate in candidates {
        match is_writable(candidate) {
            Ok(()) => {
                debug!("Using database at {}", candidate.display());
                return Ok(candidate.clone());
            }
            Err(e) => warn!("⚠️ Database location {} is not usable: {}", candidate.display(), e),
        }
    }
    Err(Error::ConfigurationMissing(
        "no writable database location".to_string(),
    ))
}
