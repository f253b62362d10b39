//! Vector store backends

mod factory;
mod in_memory;
mod pgvector;

pub use factory::{StoreBackend, StoreConfig, StoreFactory};
pub use in_memory::InMemoryVectorStore;
pub use pgvector::{table_name, PgvectorConfig, PgvectorStore};
