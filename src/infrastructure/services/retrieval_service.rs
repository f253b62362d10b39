//! Tiered retrieval service
//!
//! Looks a value up in the vector store, then the local cache, then the live
//! source, and writes a freshly derived value back into both durable tiers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::cache::Cache;
use crate::domain::collection::{slugify, CollectionDescriptor, QueryParameters, DRUG_DOSAGE, DRUG_INTERACTIONS};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::fetch::DocumentFetcher;
use crate::domain::patient::AgeGroup;
use crate::domain::retrieval::{is_valid_payload, RetrievalResult, Tier};
use crate::domain::retry::RetryExecutor;
use crate::domain::store::{HybridQuery, Properties, VectorStore};
use crate::domain::template::render_template;
use crate::domain::DomainError;

/// Default weight of vector similarity in the hybrid score
pub const DEFAULT_HYBRID_ALPHA: f32 = 0.6;

/// Cache key, fetch URL and embedding text resolved before any I/O
#[derive(Debug, Clone)]
struct LookupPlan {
    cache_key: String,
    url: String,
    query_text: String,
}

impl LookupPlan {
    fn resolve(params: &QueryParameters, descriptor: &CollectionDescriptor) -> Result<Self, DomainError> {
        let subject = params.require(descriptor.primary_field())?;

        let cache_key = render_template(descriptor.cache_key_template, &params.to_map())?;

        let url_values = HashMap::from([("drug".to_string(), slugify(subject))]);
        let url = render_template(descriptor.fetch.url_template, &url_values)?;

        let query_text = format!("{} {}", params.query_text(), descriptor.result_field);

        Ok(Self {
            cache_key,
            url,
            query_text,
        })
    }
}

/// Retrieval orchestrator over the store, cache and live-fetch tiers
#[derive(Debug)]
pub struct RetrievalService {
    store: Arc<dyn VectorStore>,
    cache: Arc<dyn Cache>,
    embeddings: Arc<dyn EmbeddingProvider>,
    fetcher: Arc<dyn DocumentFetcher>,
    store_retry: RetryExecutor,
    embedding_retry: RetryExecutor,
    hybrid_alpha: f32,
}

impl RetrievalService {
    /// Creates a service whose store and embedding calls share `store_retry`
    pub fn new(
        store: Arc<dyn VectorStore>,
        cache: Arc<dyn Cache>,
        embeddings: Arc<dyn EmbeddingProvider>,
        fetcher: Arc<dyn DocumentFetcher>,
        store_retry: RetryExecutor,
    ) -> Self {
        Self {
            store,
            cache,
            embeddings,
            fetcher,
            embedding_retry: store_retry.clone(),
            store_retry,
            hybrid_alpha: DEFAULT_HYBRID_ALPHA,
        }
    }

    pub fn with_embedding_retry(mut self, retry: RetryExecutor) -> Self {
        self.embedding_retry = retry;
        self
    }

    pub fn with_hybrid_alpha(mut self, alpha: f32) -> Self {
        self.hybrid_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Dosage text for `drug` treating `symptom` in `age_group`
    pub async fn dosage(
        &self,
        drug: &str,
        symptom: &str,
        age_group: AgeGroup,
    ) -> Result<RetrievalResult, DomainError> {
        let params = QueryParameters::new()
            .with("drugName", drug)
            .with("symptom", symptom)
            .with("ageGroup", age_group.as_str());

        self.retrieve(&params, &DRUG_DOSAGE).await
    }

    /// Food and alcohol interaction text for `drug`
    pub async fn interactions(&self, drug: &str) -> Result<RetrievalResult, DomainError> {
        let params = QueryParameters::new().with("drugName", drug);

        self.retrieve(&params, &DRUG_INTERACTIONS).await
    }

    /// Runs the tiered lookup for one collection.
    ///
    /// Only malformed input is an error. Tier failures are logged and fall
    /// through to the next tier; the live tier always produces a value.
    pub async fn retrieve(
        &self,
        params: &QueryParameters,
        descriptor: &CollectionDescriptor,
    ) -> Result<RetrievalResult, DomainError> {
        let plan = LookupPlan::resolve(params, descriptor)?;
        let collection = descriptor.name;

        let vector = self.embed_query(&plan.query_text).await;

        if let Some(vector) = &vector {
            if let Some(value) = self.from_store(params, descriptor, &plan, vector).await {
                info!(collection, tier = %Tier::Store, "Retrieved value");
                return Ok(RetrievalResult::new(value, Tier::Store));
            }
        }

        if let Some(value) = self.from_cache(collection, &plan.cache_key).await {
            info!(collection, tier = %Tier::Cache, key = %plan.cache_key, "Retrieved value");
            return Ok(RetrievalResult::new(value, Tier::Cache));
        }

        let value = self.from_live_source(params, descriptor, &plan.url).await;

        self.write_back(params, descriptor, &plan, vector.as_deref(), &value)
            .await;

        info!(collection, tier = %Tier::LiveFetch, url = %plan.url, "Retrieved value");
        Ok(RetrievalResult::new(value, Tier::LiveFetch))
    }

    async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let embeddings = &self.embeddings;
        let texts = [text.to_string()];
        let texts = &texts;

        let result = self
            .embedding_retry
            .run("embedding.embed", || async move { embeddings.embed(texts).await })
            .await;

        match result.map(|vectors| vectors.into_iter().next()) {
            Ok(Some(vector)) => Some(vector),
            Ok(None) => {
                warn!(query = text, "Embedding provider returned no vector, skipping store tier");
                None
            }
            Err(e) => {
                warn!(query = text, error = %e, "Embedding failed, skipping store tier");
                None
            }
        }
    }

    async fn from_store(
        &self,
        params: &QueryParameters,
        descriptor: &CollectionDescriptor,
        plan: &LookupPlan,
        vector: &[f32],
    ) -> Option<String> {
        let query = HybridQuery::new(descriptor.name, plan.query_text.as_str(), vector.to_vec())
            .with_return_fields(descriptor.query_fields)
            .with_filters(params.restrict_to(descriptor.filter_fields))
            .with_limit(1)
            .with_alpha(self.hybrid_alpha);

        let store = &self.store;
        let query = &query;

        let candidates = match self
            .store_retry
            .run("vector_store.query", || async move { store.query(query).await })
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(collection = descriptor.name, error = %e, "Store query failed, treating as miss");
                return None;
            }
        };

        if candidates.is_empty() {
            debug!(collection = descriptor.name, query = %plan.query_text, "Store miss");
            return None;
        }

        let all_valid = candidates.iter().all(|candidate| {
            candidate
                .get(descriptor.result_field)
                .is_some_and(|value| is_valid_payload(value))
        });

        if !all_valid {
            info!(
                collection = descriptor.name,
                query = %plan.query_text,
                "Invalid stored value, falling through"
            );
            return None;
        }

        candidates
            .into_iter()
            .next()
            .and_then(|mut candidate| candidate.remove(descriptor.result_field))
    }

    async fn from_cache(&self, collection: &str, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(value)) if is_valid_payload(&value) => Some(value),
            Ok(Some(_)) => {
                debug!(collection, key, "Invalid cached value, falling through");
                None
            }
            Ok(None) => {
                debug!(collection, key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(collection, key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn from_live_source(
        &self,
        params: &QueryParameters,
        descriptor: &CollectionDescriptor,
        url: &str,
    ) -> String {
        let content = match self.fetcher.fetch(url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(collection = descriptor.name, url, error = %e, "Live fetch failed");
                None
            }
        };

        if content.is_none() {
            info!(collection = descriptor.name, url, "No live content, extracting negative result");
        }

        let args: Vec<&str> = descriptor
            .fetch
            .extract_params
            .iter()
            .map(|field| params.get(field).unwrap_or_default())
            .collect();

        (descriptor.fetch.extract)(content.as_deref(), &args)
    }

    async fn write_back(
        &self,
        params: &QueryParameters,
        descriptor: &CollectionDescriptor,
        plan: &LookupPlan,
        vector: Option<&[f32]>,
        value: &str,
    ) {
        let collection = descriptor.name;

        match vector {
            Some(vector) => {
                let mut properties: Properties =
                    params.restrict_to(descriptor.filter_fields).into_iter().collect();
                properties.insert(descriptor.result_field.to_string(), value.to_string());

                let store = &self.store;
                let properties = &properties;

                match self
                    .store_retry
                    .run("vector_store.insert", || async move {
                        store.insert(collection, properties, vector).await
                    })
                    .await
                {
                    Ok(true) => debug!(collection, "Stored value"),
                    Ok(false) => warn!(collection, "Store rejected value"),
                    Err(e) => warn!(collection, error = %e, "Failed to store value"),
                }
            }
            None => warn!(collection, "No query vector, skipping store write-back"),
        }

        if let Err(e) = self.cache.put(&plan.cache_key, value).await {
            warn!(collection, key = %plan.cache_key, error = %e, "Failed to cache value");
        }
    }
}
