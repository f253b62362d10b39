//! Embedding provider backed by a JSON embedding endpoint

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

const PROVIDER: &str = "embedding";

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Posts `{"texts": [...], "max_length": N}` and reads `{"embeddings": [[...]]}`
#[derive(Debug)]
pub struct HttpEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    url: String,
    max_length: usize,
}

impl<C: HttpClientTrait> HttpEmbeddingProvider<C> {
    pub fn new(client: C, url: impl Into<String>, max_length: usize) -> Self {
        Self {
            client,
            url: url.into(),
            max_length,
        }
    }

    fn build_request(&self, texts: &[String]) -> serde_json::Value {
        serde_json::json!({
            "texts": texts,
            "max_length": self.max_length,
        })
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let response: EmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embeddings.len() != expected {
            return Err(DomainError::provider(
                PROVIDER,
                format!(
                    "Expected {} embeddings, received {}",
                    expected,
                    response.embeddings.len()
                ),
            ));
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for HttpEmbeddingProvider<C> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.build_request(texts);
        let response = self.client.post_json(&self.url, &body).await?;
        let embeddings = self.parse_response(response, texts.len())?;

        debug!(count = embeddings.len(), "Generated embeddings");
        Ok(embeddings)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn max_length(&self) -> usize {
        self.max_length
    }
}
