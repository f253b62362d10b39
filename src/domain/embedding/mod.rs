//! Embedding domain - Text to vector conversion

mod provider;

pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::mock;
