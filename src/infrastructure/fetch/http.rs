//! Document fetcher with status-aware retries

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::fetch::DocumentFetcher;
use crate::domain::retry::RetryExecutor;
use crate::domain::DomainError;
use crate::infrastructure::http::{HttpClientTrait, TextResponse};

/// Statuses retried by default
pub const DEFAULT_STATUS_FORCELIST: &[u16] = &[429, 502, 503, 504];

/// Fetches documents over HTTP GET
///
/// Transport errors and statuses in the forcelist are retried under the
/// fetch retry policy. Any other non-success status, or running out of
/// attempts, yields absent content.
#[derive(Debug)]
pub struct HttpDocumentFetcher<C: HttpClientTrait> {
    client: C,
    retry: RetryExecutor,
    status_forcelist: Vec<u16>,
}

impl<C: HttpClientTrait> HttpDocumentFetcher<C> {
    pub fn new(client: C, retry: RetryExecutor) -> Self {
        Self {
            client,
            retry,
            status_forcelist: DEFAULT_STATUS_FORCELIST.to_vec(),
        }
    }

    pub fn with_status_forcelist(mut self, statuses: Vec<u16>) -> Self {
        self.status_forcelist = statuses;
        self
    }

    async fn get_with_retry(&self, url: &str) -> Result<TextResponse, DomainError> {
        let client = &self.client;
        let forcelist = &self.status_forcelist;

        self.retry
            .run("live_fetch.get", || async move {
                let response = client.get_text(url).await?;

                if forcelist.contains(&response.status) {
                    return Err(DomainError::fetch(url, format!("HTTP {}", response.status)));
                }

                Ok(response)
            })
            .await
    }
}

#[async_trait]
impl<C: HttpClientTrait> DocumentFetcher for HttpDocumentFetcher<C> {
    async fn fetch(&self, url: &str) -> Result<Option<String>, DomainError> {
        match self.get_with_retry(url).await {
            Ok(response) if response.is_success() => {
                debug!(url, bytes = response.body.len(), "Fetched document");
                Ok(Some(response.body))
            }
            Ok(response) => {
                warn!(url, status = response.status, "Fetch returned non-success status");
                Ok(None)
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::retry::mock::instant_executor;
    use crate::infrastructure::http::mock::MockHttpClient;
    use crate::infrastructure::http::HttpClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://www.drugs.com/dosage/aspirin.html";

    #[tokio::test]
    async fn test_success() {
        let client = MockHttpClient::new().with_text(URL, 200, "<html>ok</html>");
        let fetcher = HttpDocumentFetcher::new(client, instant_executor(2, 0.2));

        assert_eq!(
            fetcher.fetch(URL).await.unwrap(),
            Some("<html>ok</html>".to_string())
        );
    }

    #[tokio::test]
    async fn test_forcelisted_status_is_retried() {
        let client = MockHttpClient::new()
            .with_text(URL, 503, "busy")
            .with_text(URL, 200, "<html>ok</html>");
        let fetcher = HttpDocumentFetcher::new(client, instant_executor(2, 0.2));

        assert_eq!(
            fetcher.fetch(URL).await.unwrap(),
            Some("<html>ok</html>".to_string())
        );
        assert_eq!(fetcher.client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_absent_without_retry() {
        let client = MockHttpClient::new().with_text(URL, 404, "missing");
        let fetcher = HttpDocumentFetcher::new(client, instant_executor(3, 0.2));

        assert_eq!(fetcher.fetch(URL).await.unwrap(), None);
        assert_eq!(fetcher.client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_absent() {
        let fetcher = HttpDocumentFetcher::new(MockHttpClient::new(), instant_executor(2, 0.2));

        assert_eq!(fetcher.fetch(URL).await.unwrap(), None);
        assert_eq!(fetcher.client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_over_http_retries_gateway_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dosage/ibuprofen.html"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dosage/ibuprofen.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h2>Usual Adult Dose</h2>"))
            .mount(&server)
            .await;

        let fetcher = HttpDocumentFetcher::new(HttpClient::new(), instant_executor(2, 0.2));
        let body = fetcher
            .fetch(&format!("{}/dosage/ibuprofen.html", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, Some("<h2>Usual Adult Dose</h2>".to_string()));
    }
}
