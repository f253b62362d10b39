//! Persistent store domain - Hybrid (lexical + vector) search gateway

mod gateway;

pub use gateway::{record_id, HybridQuery, Properties, VectorStore};

#[cfg(test)]
pub use gateway::mock;
