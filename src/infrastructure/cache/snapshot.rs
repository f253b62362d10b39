//! Cache bound to a snapshot file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Decorates a cache so that every `put` rewrites its snapshot file
///
/// The snapshot is loaded once on [`SnapshotCache::open`] and written again
/// on [`SnapshotCache::flush`]. Snapshot I/O failures are logged and never
/// fail the cache operation that triggered them.
#[derive(Debug)]
pub struct SnapshotCache {
    inner: Arc<dyn Cache>,
    path: PathBuf,
}

impl SnapshotCache {
    /// Wraps `inner` and loads the snapshot at `path` into it
    pub async fn open(inner: Arc<dyn Cache>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        match inner.load(&path).await {
            Ok(0) => debug!(path = %path.display(), "No cache snapshot loaded"),
            Ok(count) => info!(path = %path.display(), entries = count, "Loaded cache snapshot"),
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable cache snapshot"),
        }

        Self { inner, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot now
    pub async fn flush(&self) -> Result<(), DomainError> {
        self.inner.save(&self.path).await?;
        debug!(path = %self.path.display(), "Saved cache snapshot");
        Ok(())
    }
}

#[async_trait]
impl Cache for SnapshotCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.inner.put(key, value).await?;

        if let Err(e) = self.flush().await {
            warn!(path = %self.path.display(), error = %e, "Failed to save cache snapshot");
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.inner.len().await
    }

    async fn entries(&self) -> Result<Vec<(String, String)>, DomainError> {
        self.inner.entries().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig};

    fn memory_cache() -> Arc<dyn Cache> {
        Arc::new(InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_max_size(10),
        ))
    }

    #[tokio::test]
    async fn test_put_rewrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan_cache.json");

        let cache = SnapshotCache::open(memory_cache(), &path).await;
        cache.put("plan-key", "Dosage Plan:\n...").await.unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(saved["plan-key"], "Dosage Plan:\n...");
    }

    #[tokio::test]
    async fn test_open_restores_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraped_cache.json");

        let first = SnapshotCache::open(memory_cache(), &path).await;
        first.put("interactions:aspirin", "Avoid alcohol with aspirin").await.unwrap();

        let second = SnapshotCache::open(memory_cache(), &path).await;
        assert_eq!(
            second.get("interactions:aspirin").await.unwrap(),
            Some("Avoid alcohol with aspirin".to_string())
        );
    }

    #[tokio::test]
    async fn test_open_ignores_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embed_cache.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let cache = SnapshotCache::open(memory_cache(), &path).await;
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_does_not_fail_put() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be makes every write fail
        let path = dir.path().join("blocked");
        tokio::fs::create_dir_all(&path).await.unwrap();

        let cache = SnapshotCache::open(memory_cache(), &path).await;

        assert!(cache.put("a", "1").await.is_ok());
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert!(cache.flush().await.is_err());
    }
}
