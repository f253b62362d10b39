//! Text generator backed by a JSON generation endpoint

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::generation::{SamplingParams, TextGenerator};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

const PROVIDER: &str = "generation";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

/// Posts `{"prompt", "sampling_params"}` and reads `{"generated_text"}`
#[derive(Debug)]
pub struct HttpTextGenerator<C: HttpClientTrait> {
    client: C,
    url: String,
}

impl<C: HttpClientTrait> HttpTextGenerator<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> TextGenerator for HttpTextGenerator<C> {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, DomainError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "sampling_params": params,
        });

        let json = self.client.post_json(&self.url, &body).await?;
        let response: GenerateResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse generation response: {}", e))
        })?;

        debug!(chars = response.generated_text.chars().count(), "Generated text");
        Ok(response.generated_text)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::mock::MockHttpClient;
    use crate::infrastructure::http::HttpClient;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(body_partial_json(serde_json::json!({
                "prompt": "Write a plan",
                "sampling_params": { "max_tokens": 200, "min_tokens": 100 },
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "generated_text": "Hello! ..." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let generator =
            HttpTextGenerator::new(HttpClient::new(), format!("{}/generate", server.uri()));

        let text = generator
            .generate("Write a plan", &SamplingParams::precise())
            .await
            .unwrap();

        assert_eq!(text, "Hello! ...");
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "oom" })))
            .mount(&server)
            .await;

        let generator = HttpTextGenerator::new(HttpClient::new(), server.uri());
        let result = generator.generate("p", &SamplingParams::precise()).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let client =
            MockHttpClient::new().with_json("http://gen", serde_json::json!({ "text": "x" }));
        let generator = HttpTextGenerator::new(client, "http://gen");

        let result = generator.generate("p", &SamplingParams::precise()).await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }
}
