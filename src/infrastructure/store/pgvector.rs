//! pgvector-backed store with hybrid (vector + full-text) ranking

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tokio::sync::RwLock;
use crate::domain::collection::CollectionDescriptor;
use crate::domain::store::{record_id, HybridQuery, Properties, VectorStore};
use crate::domain::DomainError;

/// Connection settings for [`PgvectorStore`]
#[derive(Debug, Clone)]
pub struct PgvectorConfig {
    pub url: String,
    pub max_connections: u32,
    /// Text search configuration used for `to_tsvector` and `plainto_tsquery`
    pub text_search_config: String,
}

impl PgvectorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            text_search_config: "english".to_string(),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

/// Store keeping one table per collection
///
/// Each row holds the record's properties as JSONB, a `tsvector` over the
/// property values, and the embedding. Records are ranked by
/// `alpha * (1 - cosine_distance) + (1 - alpha) * ts_rank`. Row ids derive
/// from the collection's filter-field values, so re-inserting a key
/// overwrites the row.
pub struct PgvectorStore {
    config: PgvectorConfig,
    pool: RwLock<Option<PgPool>>,
    key_fields: RwLock<HashMap<String, &'static [&'static str]>>,
}

impl Debug for PgvectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgvectorStore")
            .field("max_connections", &self.config.max_connections)
            .field("text_search_config", &self.config.text_search_config)
            .finish_non_exhaustive()
    }
}

impl PgvectorStore {
    pub fn new(config: PgvectorConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            key_fields: RwLock::new(HashMap::new()),
        }
    }

    async fn pool(&self) -> Result<PgPool, DomainError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| DomainError::storage("Vector store is not connected"))
    }
}

/// Table name for a collection, e.g. `DrugDosage` -> `drug_dosage`
pub fn table_name(collection: &str) -> String {
    let mut name = String::with_capacity(collection.len() + 4);

    for (i, c) in collection.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }

    name
}

fn vector_literal(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

fn filters_json(filters: &[(String, String)]) -> serde_json::Value {
    serde_json::Value::Object(
        filters
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

#[async_trait]
impl VectorStore for PgvectorStore {
    fn provider_type(&self) -> &'static str {
        "pgvector"
    }

    async fn connect(&self) -> Result<(), DomainError> {
        let mut pool = self.pool.write().await;

        if pool.is_some() {
            return Ok(());
        }

        let connected = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect(&self.config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        tracing::info!(max_connections = self.config.max_connections, "Connected to pgvector store");
        *pool = Some(connected);

        Ok(())
    }

    async fn ensure_schema(&self, descriptors: &[&CollectionDescriptor]) -> Result<(), DomainError> {
        let pool = self.pool().await?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create vector extension: {}", e)))?;

        for descriptor in descriptors {
            let table = table_name(descriptor.name);

            let statements = [
                format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        id UUID PRIMARY KEY,
                        properties JSONB NOT NULL,
                        search_text TSVECTOR NOT NULL,
                        embedding VECTOR NOT NULL,
                        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    )
                    "#
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_properties ON {table} USING GIN (properties)"
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_search_text ON {table} USING GIN (search_text)"
                ),
            ];

            for statement in &statements {
                sqlx::query(statement).execute(&pool).await.map_err(|e| {
                    DomainError::storage(format!("Failed to create collection {}: {}", descriptor.name, e))
                })?;
            }

            self.key_fields
                .write()
                .await
                .insert(descriptor.name.to_string(), descriptor.filter_fields);

            tracing::debug!(collection = descriptor.name, table = %table, "Collection ready");
        }

        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        properties: &Properties,
        vector: &[f32],
    ) -> Result<bool, DomainError> {
        let Some(key_fields) = self.key_fields.read().await.get(collection).copied() else {
            tracing::warn!(collection, "Insert rejected, unknown collection");
            return Ok(false);
        };

        let pool = self.pool().await?;
        let table = table_name(collection);

        let properties_json = serde_json::to_value(properties)
            .map_err(|e| DomainError::storage(format!("Failed to serialize properties: {}", e)))?;
        let text = properties.values().cloned().collect::<Vec<_>>().join(" ");

        let sql = format!(
            r#"
            INSERT INTO {table} (id, properties, search_text, embedding)
            VALUES ($1, $2, to_tsvector($3::regconfig, $4), $5::vector)
            ON CONFLICT (id) DO UPDATE SET
                properties = EXCLUDED.properties,
                search_text = EXCLUDED.search_text,
                embedding = EXCLUDED.embedding,
                created_at = NOW()
            "#
        );

        let result = sqlx::query(&sql)
            .bind(record_id(collection, key_fields, properties))
            .bind(&properties_json)
            .bind(&self.config.text_search_config)
            .bind(&text)
            .bind(vector_literal(vector))
            .execute(&pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert into {}: {}", collection, e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn query(&self, query: &HybridQuery) -> Result<Vec<Properties>, DomainError> {
        let pool = self.pool().await?;
        let table = table_name(&query.collection);

        let sql = format!(
            r#"
            SELECT properties
            FROM {table}
            WHERE properties @> $1
            ORDER BY $2 * (1 - (embedding <=> $3::vector))
                + (1 - $2) * ts_rank(search_text, plainto_tsquery($4::regconfig, $5)) DESC
            LIMIT $6
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filters_json(&query.filters))
            .bind(query.alpha as f64)
            .bind(vector_literal(&query.vector))
            .bind(&self.config.text_search_config)
            .bind(&query.text)
            .bind(query.limit as i64)
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to query {}: {}", query.collection, e))
            })?;

        rows.iter()
            .map(|row| {
                let value: serde_json::Value = row.try_get("properties").map_err(|e| {
                    DomainError::storage(format!("Invalid row in {}: {}", query.collection, e))
                })?;
                let properties: Properties = serde_json::from_value(value).map_err(|e| {
                    DomainError::storage(format!("Invalid properties in {}: {}", query.collection, e))
                })?;
                Ok(query.project(&properties))
            })
            .collect()
    }

    async fn close(&self) -> Result<(), DomainError> {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            tracing::info!("Closed pgvector store");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("DrugDosage"), "drug_dosage");
        assert_eq!(table_name("DrugInteractions"), "drug_interactions");
        assert_eq!(table_name("plain"), "plain");
        assert_eq!(table_name("with-dash"), "with_dash");
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, 1.0, -2.0]), "[0.5,1,-2]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_filters_json() {
        let json = filters_json(&[("drugName".to_string(), "aspirin".to_string())]);
        assert_eq!(json, serde_json::json!({"drugName": "aspirin"}));
    }

    #[tokio::test]
    async fn test_close_without_connect_is_noop() {
        let store = PgvectorStore::new(PgvectorConfig::new("postgres://localhost/unused"));

        store.close().await.unwrap();
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_into_unregistered_collection_is_rejected() {
        let store = PgvectorStore::new(PgvectorConfig::new("postgres://localhost/unused"));
        let properties = Properties::from([("drugName".to_string(), "aspirin".to_string())]);

        let inserted = store.insert("DrugInteractions", &properties, &[1.0]).await.unwrap();
        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_query_before_connect_is_storage_error() {
        let store = PgvectorStore::new(PgvectorConfig::new("postgres://localhost/unused"));
        let query = HybridQuery::new("DrugDosage", "aspirin", vec![1.0]);

        let result = store.query(&query).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
