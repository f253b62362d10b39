//! Persistent store gateway trait

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::collection::CollectionDescriptor;
use crate::domain::DomainError;

/// Stored record properties, field name to value
pub type Properties = BTreeMap<String, String>;

/// Filtered hybrid query against one collection
#[derive(Debug, Clone)]
pub struct HybridQuery {
    pub collection: String,
    /// Text for the lexical half of the score
    pub text: String,
    /// Vector for the similarity half of the score
    pub vector: Vec<f32>,
    /// Properties to return for each match
    pub return_fields: Vec<String>,
    /// Equality filters, all of which must match
    pub filters: Vec<(String, String)>,
    pub limit: usize,
    /// Weight of vector similarity; `1 - alpha` goes to lexical relevance
    pub alpha: f32,
}

impl HybridQuery {
    pub fn new(collection: impl Into<String>, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            collection: collection.into(),
            text: text.into(),
            vector,
            return_fields: Vec::new(),
            filters: Vec::new(),
            limit: 1,
            alpha: 0.6,
        }
    }

    pub fn with_return_fields(mut self, fields: &[&str]) -> Self {
        self.return_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_filters(mut self, filters: Vec<(String, String)>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Whether `properties` satisfies every equality filter
    pub fn matches_filters(&self, properties: &Properties) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| properties.get(field) == Some(value))
    }

    /// Copy of `properties` restricted to the requested return fields
    pub fn project(&self, properties: &Properties) -> Properties {
        if self.return_fields.is_empty() {
            return properties.clone();
        }

        properties
            .iter()
            .filter(|(field, _)| self.return_fields.contains(field))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Stable identity of a record: its collection plus the values of the
/// collection's key fields. Re-inserting the same key overwrites the record.
pub fn record_id(collection: &str, key_fields: &[&str], properties: &Properties) -> Uuid {
    let mut name = collection.to_string();
    for field in key_fields {
        name.push('\n');
        name.push_str(field);
        name.push('=');
        name.push_str(properties.get(*field).map(String::as_str).unwrap_or_default());
    }

    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Gateway to a semantic/hybrid-search backend
///
/// The gateway owns its connection exclusively. `close` is idempotent and
/// a no-op when no connection was ever established.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    fn provider_type(&self) -> &'static str;

    async fn connect(&self) -> Result<(), DomainError>;

    /// Create any missing collections
    async fn ensure_schema(&self, descriptors: &[&CollectionDescriptor]) -> Result<(), DomainError>;

    /// Insert a record, overwriting any record with the same filter-field
    /// values; `Ok(false)` when the backend rejected it
    async fn insert(
        &self,
        collection: &str,
        properties: &Properties,
        vector: &[f32],
    ) -> Result<bool, DomainError>;

    /// Top `limit` records by hybrid relevance among those matching the filters
    async fn query(&self, query: &HybridQuery) -> Result<Vec<Properties>, DomainError>;

    async fn close(&self) -> Result<(), DomainError>;
}
