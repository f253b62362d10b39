//! In-memory vector store for development and testing

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::collection::CollectionDescriptor;
use crate::domain::store::{record_id, HybridQuery, Properties, VectorStore};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: Uuid,
    properties: Properties,
    tokens: HashSet<String>,
    vector: Vec<f32>,
}

#[derive(Debug, Default)]
struct Collection {
    key_fields: &'static [&'static str],
    records: Vec<StoredRecord>,
}

/// Process-local vector store
///
/// Ranks records by `alpha * cosine + (1 - alpha) * lexical_overlap`, where
/// lexical overlap is the share of query terms found in the record's
/// property values.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    connected: AtomicBool,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of records held for `collection`
    pub async fn record_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

fn lexical_overlap(query: &HashSet<String>, record: &HashSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }

    query.intersection(record).count() as f32 / query.len() as f32
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_type(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<(), DomainError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_schema(&self, descriptors: &[&CollectionDescriptor]) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;

        for descriptor in descriptors {
            collections
                .entry(descriptor.name.to_string())
                .or_insert_with(|| {
                    tracing::info!(collection = descriptor.name, "Created collection");
                    Collection {
                        key_fields: descriptor.filter_fields,
                        records: Vec::new(),
                    }
                });
        }

        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        properties: &Properties,
        vector: &[f32],
    ) -> Result<bool, DomainError> {
        let mut collections = self.collections.write().await;

        let Some(entry) = collections.get_mut(collection) else {
            tracing::warn!(collection, "Insert rejected, unknown collection");
            return Ok(false);
        };

        let text = properties.values().cloned().collect::<Vec<_>>().join(" ");
        let record = StoredRecord {
            id: record_id(collection, entry.key_fields, properties),
            properties: properties.clone(),
            tokens: tokenize(&text),
            vector: vector.to_vec(),
        };

        match entry.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                tracing::debug!(collection, id = %record.id, "Replaced record");
                *existing = record;
            }
            None => {
                tracing::debug!(collection, id = %record.id, "Inserted record");
                entry.records.push(record);
            }
        }

        Ok(true)
    }

    async fn query(&self, query: &HybridQuery) -> Result<Vec<Properties>, DomainError> {
        let collections = self.collections.read().await;

        let Some(entry) = collections.get(&query.collection) else {
            tracing::debug!(collection = %query.collection, "Query on unknown collection");
            return Ok(Vec::new());
        };

        let query_tokens = tokenize(&query.text);

        let mut scored: Vec<(f32, &StoredRecord)> = entry
            .records
            .iter()
            .filter(|record| query.matches_filters(&record.properties))
            .map(|record| {
                let score = query.alpha * cosine_similarity(&query.vector, &record.vector)
                    + (1.0 - query.alpha) * lexical_overlap(&query_tokens, &record.tokens);
                (score, record)
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(query.limit)
            .map(|(_, record)| query.project(&record.properties))
            .collect())
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
