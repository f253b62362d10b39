use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Fetches raw documents by URL
#[async_trait]
pub trait DocumentFetcher: Send + Sync + Debug {
    /// Raw content of `url`, or `None` when nothing could be fetched
    async fn fetch(&self, url: &str) -> Result<Option<String>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned documents by URL and records every request
    #[derive(Debug, Default)]
    pub struct MockDocumentFetcher {
        documents: HashMap<String, String>,
        error: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl MockDocumentFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.documents.insert(url.into(), body.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn fetch_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DocumentFetcher for MockDocumentFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>, DomainError> {
            self.requests.lock().unwrap().push(url.to_string());

            if let Some(ref error) = self.error {
                return Err(DomainError::fetch(url, error));
            }

            Ok(self.documents.get(url).cloned())
        }
    }
}
