//! Embedding provider implementations

mod cached;
mod http;

pub use cached::CachedEmbeddingProvider;
pub use http::HttpEmbeddingProvider;
