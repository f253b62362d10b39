//! Live document fetching

mod http;

pub use http::HttpDocumentFetcher;
