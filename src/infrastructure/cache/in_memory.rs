//! In-memory bounded, expiring, least-recently-used cache

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Source of the current time in milliseconds
pub trait Clock: Send + Sync + Debug {
    fn now_millis(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// Entries older than this (measured from their last write) are expired
    pub expiry: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            expiry: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn new(max_size: usize, expiry: Duration) -> Self {
        Self { max_size, expiry }
    }

    /// Sets the maximum number of entries
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the expiry in days
    pub fn with_expiry_days(mut self, days: u64) -> Self {
        self.expiry = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    /// Time of the last write (millis since epoch)
    inserted_at: u64,
    /// Position in the recency order
    recency: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Recency tick -> key, oldest first
    order: BTreeMap<u64, String>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &str) {
        let tick = self.next_tick();

        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.recency);
            entry.recency = tick;
            self.order.insert(tick, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.order.remove(&entry.recency);
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Thread-safe bounded cache with per-entry expiry
///
/// - `get` checks expiry lazily; expired entries are removed on read
/// - reads and writes mark an entry most recently used
/// - expiry is measured from the last `put`, reads do not extend it
/// - when a `put` pushes the size past `max_size`, the least recently used
///   entry is evicted
#[derive(Debug)]
pub struct InMemoryCache {
    state: Mutex<CacheState>,
    config: InMemoryCacheConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: InMemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config,
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::cache("Cache state lock poisoned"))
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.inserted_at) >= self.config.expiry.as_millis() as u64
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = self.clock.now_millis();
        let mut state = self.lock()?;

        let value = match state.entries.get(key) {
            None => return Ok(None),
            Some(entry) if self.is_expired(entry, now) => None,
            Some(entry) => Some(entry.value.clone()),
        };

        match value {
            Some(value) => {
                state.touch(key);
                Ok(Some(value))
            }
            None => {
                state.remove(key);
                debug!(key, "Cache entry expired");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let now = self.clock.now_millis();
        let mut state = self.lock()?;
        let tick = state.next_tick();

        let previous = state.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                inserted_at: now,
                recency: tick,
            },
        );

        if let Some(previous) = previous {
            state.order.remove(&previous.recency);
        }
        state.order.insert(tick, key.to_string());

        while state.entries.len() > self.config.max_size {
            match state.evict_lru() {
                Some(evicted) => debug!(key = %evicted, "Evicted least recently used entry"),
                None => break,
            }
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.entries.len())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>, DomainError> {
        let now = self.clock.now_millis();
        let state = self.lock()?;

        Ok(state
            .order
            .values()
            .filter_map(|key| state.entries.get(key).map(|entry| (key, entry)))
            .filter(|(_, entry)| !self.is_expired(entry, now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }
}
