//! Cache trait definition

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Bounded key-value cache of string values
///
/// Snapshots are a single JSON object mapping key to value, written in
/// least- to most-recently-used order so that a reload through `put`
/// reproduces the recency order.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a value, or `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Inserts or replaces a value, marking it most recently used
    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Returns the number of resident entries
    async fn len(&self) -> Result<usize, DomainError>;

    /// Returns unexpired entries, least recently used first
    async fn entries(&self) -> Result<Vec<(String, String)>, DomainError>;

    /// Writes all unexpired entries to `path`
    async fn save(&self, path: &Path) -> Result<(), DomainError> {
        let mut snapshot = serde_json::Map::new();

        for (key, value) in self.entries().await? {
            snapshot.insert(key, serde_json::Value::String(value));
        }

        let data = serde_json::to_string(&serde_json::Value::Object(snapshot))
            .map_err(|e| DomainError::cache(format!("Failed to serialize snapshot: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::cache(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(path, data)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Loads a snapshot from `path` through `put`, returning the number of
    /// entries read. A missing file loads nothing.
    async fn load(&self, path: &Path) -> Result<usize, DomainError> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(DomainError::cache(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let snapshot: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&data)
            .map_err(|e| DomainError::cache(format!("Invalid snapshot {}: {}", path.display(), e)))?;

        let mut loaded = 0;

        for (key, value) in snapshot {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            self.put(&key, &value).await?;
            loaded += 1;
        }

        Ok(loaded)
    }
}

/// Extension trait providing typed get/put operations
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get_typed<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Puts a typed value into the cache
    fn put_typed<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.put(key, &data).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}
