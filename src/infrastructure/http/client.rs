use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

const USER_AGENT: &str = concat!("dosage-guidance/", env!("CARGO_PKG_VERSION"));

/// Status and body of a GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub status: u16,
    pub body: String,
}

impl TextResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POST a JSON body and parse a JSON response; non-2xx is an error
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;

    /// GET a text body; any status is returned, transport failures are errors
    async fn get_text(&self, url: &str) -> Result<TextResponse, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::provider("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "http",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }

    async fn get_text(&self, url: &str) -> Result<TextResponse, DomainError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::fetch(url, format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::fetch(url, format!("Failed to read body: {}", e)))?;

        Ok(TextResponse { status, body })
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned responses by URL, recording every request
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        json_responses: Mutex<HashMap<String, serde_json::Value>>,
        text_responses: Mutex<HashMap<String, Vec<TextResponse>>>,
        requests: Mutex<Vec<(String, Option<serde_json::Value>)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_json(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.json_responses
                .lock()
                .unwrap()
                .insert(url.into(), response);
            self
        }

        /// Queue GET responses for `url`; the last one repeats
        pub fn with_text(self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
            self.text_responses
                .lock()
                .unwrap()
                .entry(url.into())
                .or_default()
                .push(TextResponse {
                    status,
                    body: body.into(),
                });
            self
        }

        pub fn requests(&self) -> Vec<(String, Option<serde_json::Value>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DomainError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), Some(body.clone())));

            self.json_responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::provider("http", format!("HTTP 404: {}", url)))
        }

        async fn get_text(&self, url: &str) -> Result<TextResponse, DomainError> {
            self.requests.lock().unwrap().push((url.to_string(), None));

            let mut responses = self.text_responses.lock().unwrap();
            match responses.get_mut(url) {
                Some(queue) if queue.len() > 1 => Ok(queue.remove(0)),
                Some(queue) if !queue.is_empty() => Ok(queue[0].clone()),
                _ => Err(DomainError::fetch(url, "connection refused")),
            }
        }
    }
}
