//! HTTP client shared by the network gateways

mod client;

pub use client::{HttpClient, HttpClientTrait, TextResponse};

#[cfg(test)]
pub use client::mock;
