use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Retry policy with exponential backoff and no jitter
///
/// The delay after the failed attempt with index `n` (starting at 0) is
/// `backoff_factor * 2^n` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay in seconds
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: f64) -> Result<Self, DomainError> {
        let policy = Self {
            max_attempts,
            backoff_factor,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_attempts < 1 {
            return Err(DomainError::configuration(
                "retry max_attempts must be at least 1",
            ));
        }

        if !(self.backoff_factor.is_finite() && self.backoff_factor > 0.0) {
            return Err(DomainError::configuration(format!(
                "retry backoff_factor must be positive, got {}",
                self.backoff_factor
            )));
        }

        Ok(())
    }

    /// Calculate delay for a given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let seconds = self.backoff_factor * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(seconds)
    }
}
