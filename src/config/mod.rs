//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheSettings, EndpointsConfig, LogFormat, LoggingConfig, RetryConfig,
    StoreSettings, SymptomAlias, SymptomsConfig,
};
