//! Infrastructure layer - External service implementations

pub mod cache;
pub mod embedding;
pub mod fetch;
pub mod generation;
pub mod http;
pub mod logging;
pub mod services;
pub mod store;
