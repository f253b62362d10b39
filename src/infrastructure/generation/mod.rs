//! Text generation implementations

mod http;

pub use http::HttpTextGenerator;
