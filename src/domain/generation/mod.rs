//! Generation domain - Text generation gateway

mod provider;

pub use provider::{SamplingParams, TextGenerator};

#[cfg(test)]
pub use provider::mock;
