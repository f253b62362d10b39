//! Fetch domain - Raw document retrieval for live lookups

mod fetcher;

pub use fetcher::DocumentFetcher;

#[cfg(test)]
pub use fetcher::mock;
