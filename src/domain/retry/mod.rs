//! Retry domain - Bounded exponential backoff for fallible operations

mod executor;
mod policy;

pub use executor::{RetryExecutor, Sleeper, TokioSleeper};
pub use policy::RetryPolicy;

#[cfg(test)]
pub use executor::mock;
