//! Caching decorator for embedding providers

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

const NAMESPACE: &str = "embed";

/// Serves repeated texts from a cache and embeds only the misses
#[derive(Debug)]
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn Cache>,
    key_generator: DefaultKeyGenerator,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: Arc<dyn Cache>) -> Self {
        Self {
            inner,
            cache,
            key_generator: DefaultKeyGenerator::hashed(),
        }
    }

    fn cache_key(&self, text: &str) -> String {
        let params = CacheKeyParams::new(format!("{}:{}", text, self.inner.max_length()));
        self.key_generator.generate_with_namespace(NAMESPACE, &params)
    }

    async fn lookup(&self, key: &str) -> Option<Vec<f32>> {
        match self.cache.get_typed::<Vec<f32>>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "Embedding cache read failed");
                None
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let keys: Vec<String> = texts.iter().map(|t| self.cache_key(t)).collect();
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());

        for key in &keys {
            vectors.push(self.lookup(key).await);
        }

        let missing: Vec<usize> = (0..texts.len()).filter(|i| vectors[*i].is_none()).collect();

        debug!(
            requested = texts.len(),
            cached = texts.len() - missing.len(),
            "Embedding cache lookup"
        );

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|i| texts[*i].clone()).collect();
            let fresh = self.inner.embed(&batch).await?;

            if fresh.len() != batch.len() {
                return Err(DomainError::provider(
                    self.inner.provider_name(),
                    format!("Expected {} embeddings, received {}", batch.len(), fresh.len()),
                ));
            }

            for (index, vector) in missing.into_iter().zip(fresh) {
                if let Err(e) = self.cache.put_typed(&keys[index], &vector).await {
                    warn!(error = %e, "Embedding cache write failed");
                }
                vectors[index] = Some(vector);
            }
        }

        vectors
            .into_iter()
            .map(|v| v.ok_or_else(|| DomainError::internal("Embedding missing after lookup")))
            .collect()
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn max_length(&self) -> usize {
        self.inner.max_length()
    }
}
