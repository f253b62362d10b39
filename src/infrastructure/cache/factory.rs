//! Builds the application's snapshot-backed caches

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::snapshot::SnapshotCache;
use crate::domain::DomainError;

pub const EMBED_CACHE_FILE: &str = "embed_cache.json";
pub const SCRAPED_CACHE_FILE: &str = "scraped_cache.json";
pub const PLAN_CACHE_FILE: &str = "plan_cache.json";

/// Configuration for cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the snapshot files
    pub dir: PathBuf,
    /// Maximum entries per cache
    pub max_size: usize,
    /// Entry lifetime, measured from the last write
    pub expiry: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let memory = InMemoryCacheConfig::default();
        Self {
            dir: PathBuf::from("cache"),
            max_size: memory.max_size,
            expiry: memory.expiry,
        }
    }
}

/// The three application caches: embeddings, fetched answers, plans
#[derive(Debug, Clone)]
pub struct CacheSet {
    pub embeddings: Arc<SnapshotCache>,
    pub scraped: Arc<SnapshotCache>,
    pub plans: Arc<SnapshotCache>,
}

impl CacheSet {
    /// Writes every snapshot, reporting the first failure after trying all
    pub async fn flush_all(&self) -> Result<(), DomainError> {
        let mut first_error = None;

        for cache in [&self.embeddings, &self.scraped, &self.plans] {
            if let Err(e) = cache.flush().await {
                warn!(path = %cache.path().display(), error = %e, "Failed to flush cache");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Factory for creating cache instances
#[derive(Debug)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn create_in_memory(config: &CacheConfig) -> InMemoryCache {
        InMemoryCache::with_config(InMemoryCacheConfig::new(config.max_size, config.expiry))
    }

    /// Opens one bounded cache bound to `dir/file_name`
    pub async fn open_snapshot(config: &CacheConfig, file_name: &str) -> SnapshotCache {
        SnapshotCache::open(
            Arc::new(Self::create_in_memory(config)),
            snapshot_path(&config.dir, file_name),
        )
        .await
    }

    pub async fn open_all(config: &CacheConfig) -> CacheSet {
        CacheSet {
            embeddings: Arc::new(Self::open_snapshot(config, EMBED_CACHE_FILE).await),
            scraped: Arc::new(Self::open_snapshot(config, SCRAPED_CACHE_FILE).await),
            plans: Arc::new(Self::open_snapshot(config, PLAN_CACHE_FILE).await),
        }
    }
}

fn snapshot_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}
