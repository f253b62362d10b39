//! Vector store factory for runtime backend selection

use std::sync::Arc;

use crate::domain::store::VectorStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryVectorStore;
use super::pgvector::{PgvectorConfig, PgvectorStore};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Pgvector,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "pgvector" | "postgres" | "postgresql" | "pg" => Some(Self::Pgvector),
            _ => None,
        }
    }
}

/// Backend selection with its connection settings
#[derive(Debug, Clone)]
pub enum StoreConfig {
    InMemory,
    Pgvector(PgvectorConfig),
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::InMemory => StoreBackend::InMemory,
            Self::Pgvector(_) => StoreBackend::Pgvector,
        }
    }
}

/// Factory for creating vector stores
///
/// Stores are returned unconnected; the caller connects them under its own
/// retry policy.
#[derive(Debug)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn create(config: &StoreConfig) -> Arc<dyn VectorStore> {
        match config {
            StoreConfig::InMemory => Arc::new(InMemoryVectorStore::new()),
            StoreConfig::Pgvector(pg_config) => Arc::new(PgvectorStore::new(pg_config.clone())),
        }
    }

    /// Builds a store config from a backend name and optional database URL
    pub fn config_for(
        backend: &str,
        database_url: Option<&str>,
        max_connections: u32,
    ) -> Result<StoreConfig, DomainError> {
        match StoreBackend::from_str(backend) {
            Some(StoreBackend::InMemory) => Ok(StoreConfig::InMemory),
            Some(StoreBackend::Pgvector) => {
                let url = database_url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                    DomainError::configuration("store.database_url is required for the pgvector backend")
                })?;
                Ok(StoreConfig::Pgvector(
                    PgvectorConfig::new(url).with_max_connections(max_connections),
                ))
            }
            None => Err(DomainError::configuration(format!(
                "Unknown store backend: {}",
                backend
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!(StoreBackend::from_str("memory"), Some(StoreBackend::InMemory));
        assert_eq!(StoreBackend::from_str("In-Memory"), Some(StoreBackend::InMemory));
        assert_eq!(StoreBackend::from_str("pgvector"), Some(StoreBackend::Pgvector));
        assert_eq!(StoreBackend::from_str("postgres"), Some(StoreBackend::Pgvector));
        assert_eq!(StoreBackend::from_str("weaviate"), None);
    }

    #[test]
    fn test_config_for_pgvector_requires_url() {
        let result = StoreFactory::config_for("pgvector", None, 5);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));

        let result = StoreFactory::config_for("pgvector", Some("  "), 5);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));

        let config = StoreFactory::config_for("pgvector", Some("postgres://db/rx"), 8).unwrap();
        match config {
            StoreConfig::Pgvector(pg) => {
                assert_eq!(pg.url, "postgres://db/rx");
                assert_eq!(pg.max_connections, 8);
            }
            other => panic!("Expected pgvector config, got {:?}", other),
        }
    }

    #[test]
    fn test_config_for_unknown_backend() {
        let result = StoreFactory::config_for("weaviate", None, 5);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_create_selects_backend() {
        assert_eq!(StoreFactory::create(&StoreConfig::InMemory).provider_type(), "memory");

        let pg = StoreConfig::Pgvector(PgvectorConfig::new("postgres://localhost/rx"));
        assert_eq!(pg.backend(), StoreBackend::Pgvector);
        assert_eq!(StoreFactory::create(&pg).provider_type(), "pgvector");
    }
}
