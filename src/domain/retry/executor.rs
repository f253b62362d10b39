//! Retry executor - Runs an operation under a retry policy

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::RetryPolicy;
use crate::domain::DomainError;

/// Waits out a backoff delay on the calling path
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Applies a [`RetryPolicy`] to any fallible async operation
///
/// The operation is awaited in order; on failure the executor waits
/// `policy.delay_for_attempt(n)` and tries again until attempts run out,
/// then returns [`DomainError::RetryExhausted`] wrapping the last error.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Run `operation` until it succeeds or the policy's attempts are exhausted
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt = attempt + 1, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt + 1 >= max_attempts => {
                    error!(
                        operation,
                        attempts = max_attempts,
                        transient = e.is_transient(),
                        error = %e,
                        "Operation failed, retries exhausted"
                    );
                    return Err(DomainError::retry_exhausted(operation, max_attempts, e));
                }
                Err(e) => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        transient = e.is_transient(),
                        error = %e,
                        "Operation failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Sleeper that records requested delays without waiting
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.delays.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    /// Retry executor that never actually waits
    pub fn instant_executor(max_attempts: u32, backoff_factor: f64) -> RetryExecutor {
        RetryExecutor::with_sleeper(
            RetryPolicy::new(max_attempts, backoff_factor).unwrap(),
            Arc::new(RecordingSleeper::new()),
        )
    }
}
