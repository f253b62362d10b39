use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Sampling parameters forwarded to the generation backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub min_tokens: u32,
}

impl SamplingParams {
    /// Low-temperature settings for short, format-constrained output
    pub fn precise() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 200,
            min_tokens: 100,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::precise()
    }
}

/// Generates text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, DomainError>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted responses; the last one repeats once the script runs out
    #[derive(Debug)]
    pub struct MockTextGenerator {
        script: Mutex<VecDeque<Result<String, String>>>,
        last: Mutex<Option<Result<String, String>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockTextGenerator {
        pub fn new() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Always answer `text`
        pub fn returning(text: impl Into<String>) -> Self {
            Self::new().then_return(text)
        }

        pub fn then_return(self, text: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Ok(text.into()));
            self
        }

        pub fn then_fail(self, error: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Err(error.into()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl Default for MockTextGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TextGenerator for MockTextGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());

            let next = self.script.lock().unwrap().pop_front();
            let response = match next {
                Some(response) => {
                    *self.last.lock().unwrap() = Some(response.clone());
                    response
                }
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Err("No scripted response".to_string())),
            };

            response.map_err(|e| DomainError::provider("mock", e))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
