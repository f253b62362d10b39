//! Cache infrastructure - Bounded expiring cache and its snapshot lifecycle

mod factory;
mod in_memory;
mod snapshot;

pub use factory::{
    CacheConfig, CacheFactory, CacheSet, EMBED_CACHE_FILE, PLAN_CACHE_FILE, SCRAPED_CACHE_FILE,
};
pub use in_memory::{Clock, InMemoryCache, InMemoryCacheConfig, SystemClock};
pub use snapshot::SnapshotCache;

#[cfg(test)]
pub use in_memory::mock;
