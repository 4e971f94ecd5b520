use async_trait::async_trait;
use enb_core::{Error, Result, Storage, StorageSettings};
use std::sync::Arc;
use tracing::info;

pub mod backends;
pub mod paths;
pub mod seed;

pub use backends::*;
pub use seed::{apply_seed_policy, SeedReport};

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn open(settings: &StorageSettings) -> Result<Self>
    where
        Self: Sized;
}

pub const STORAGE_KINDS: &[&str] = &["memory", "sqlite"];

async fn open_backend<B>(settings: &StorageSettings) -> Result<Arc<dyn Storage>>
where
    B: StorageBackend + Storage + 'static,
{
    let backend = B::open(settings).await.map_err(|e| {
        Error::Database(format!("{} ({})", B::get_error_message(), e))
    })?;
    Ok(Arc::new(backend))
}

/// Open the named backend and apply the configured seed policy to it.
pub async fn create_storage(kind: &str, settings: &StorageSettings) -> Result<Arc<dyn Storage>> {
    let storage = match kind {
        "memory" => open_backend::<InMemoryStorage>(settings).await?,
        #[cfg(feature = "sqlite")]
        "sqlite" => open_backend::<SQLiteStorage>(settings).await?,
        other => {
            return Err(Error::ConfigurationMissing(format!(
                "unknown storage backend '{}', expected one of {:?}",
                other, STORAGE_KINDS
            )))
        }
    };

    info!("📦 Using {} storage", storage.backend_name());
    apply_seed_policy(storage.as_ref(), settings.seed_policy()).await?;
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
