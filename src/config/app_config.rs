use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::patient::SymptomCatalog;
use crate::domain::retry::RetryPolicy;
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::store::{StoreConfig, StoreFactory};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub retry: RetryConfig,
    pub cache: CacheSettings,
    pub store: StoreSettings,
    pub endpoints: EndpointsConfig,
    pub symptoms: SymptomsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Retry policies per call site
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Store connect, query and insert, plus query embedding
    pub store: RetryPolicy,
    /// Live document fetches
    pub fetch: RetryPolicy,
    /// Single generation calls
    pub generation: RetryPolicy,
    /// HTTP statuses retried by the live fetcher
    pub status_forcelist: Vec<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub max_size: usize,
    pub expiry_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `memory` or `pgvector`
    pub backend: String,
    pub database_url: Option<String>,
    pub hybrid_alpha: f32,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub embed_url: Option<String>,
    pub generate_url: Option<String>,
    pub embed_timeout_secs: u64,
    pub generate_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub embed_max_length: usize,
}

/// Input alias: any symptom matching `pattern` is read as `symptom`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SymptomAlias {
    pub pattern: String,
    pub symptom: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SymptomsConfig {
    /// Symptom to its two suggested drugs
    pub drugs: BTreeMap<String, Vec<String>>,
    pub aliases: Vec<SymptomAlias>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            store: RetryPolicy {
                max_attempts: 3,
                backoff_factor: 0.2,
            },
            fetch: RetryPolicy {
                max_attempts: 2,
                backoff_factor: 0.2,
            },
            generation: RetryPolicy {
                max_attempts: 3,
                backoff_factor: 0.2,
            },
            status_forcelist: vec![429, 502, 503, 504],
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            max_size: 1000,
            expiry_days: 30,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            hybrid_alpha: 0.6,
            max_connections: 5,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            embed_url: None,
            generate_url: None,
            embed_timeout_secs: 20,
            generate_timeout_secs: 60,
            fetch_timeout_secs: 10,
            embed_max_length: 256,
        }
    }
}

impl Default for SymptomsConfig {
    fn default() -> Self {
        let drugs = [
            ("fever", ["acetaminophen", "ibuprofen"]),
            ("pain", ["acetaminophen", "aspirin"]),
            ("cough", ["dextromethorphan", "guaifenesin"]),
            ("nasal congestion", ["pseudoephedrine", "phenylephrine"]),
            ("allergic rhinitis", ["cetirizine", "loratadine"]),
            ("urticaria", ["cetirizine", "loratadine"]),
            ("gastroesophageal reflux disease", ["omeprazole", "famotidine"]),
            ("diarrhea", ["loperamide", "bismuth subsalicylate"]),
            ("constipation", ["docusate", "senna"]),
            ("motion sickness", ["dimenhydrinate", "meclizine"]),
            ("vertigo", ["dimenhydrinate", "meclizine"]),
            ("insomnia", ["diphenhydramine", "doxylamine"]),
            ("anxiety", ["lorazepam", "diazepam"]),
            ("hypertension", ["lisinopril", "amlodipine"]),
            ("panic attack", ["alprazolam", "clonazepam"]),
        ]
        .into_iter()
        .map(|(symptom, pair)| {
            (
                symptom.to_string(),
                pair.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect();

        let aliases = [
            ("headache", "pain"),
            ("heartburn|acid reflux", "gastroesophageal reflux disease"),
            ("nausea|vomiting", "motion sickness"),
        ]
        .into_iter()
        .map(|(pattern, symptom)| SymptomAlias {
            pattern: pattern.to_string(),
            symptom: symptom.to_string(),
        })
        .collect();

        Self { drugs, aliases }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), DomainError> {
        for (name, policy) in [
            ("store", &self.store),
            ("fetch", &self.fetch),
            ("generation", &self.generation),
        ] {
            policy.validate().map_err(|e| {
                DomainError::configuration(format!("retry.{}: {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// Upper bound for `cache.expiry_days`, one hundred years
pub const MAX_CACHE_EXPIRY_DAYS: u64 = 36_500;

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            dir: self.dir.clone(),
            max_size: self.max_size,
            expiry: Duration::from_secs(self.expiry_days.saturating_mul(24 * 60 * 60)),
        }
    }
}

impl StoreSettings {
    pub fn to_store_config(&self) -> Result<StoreConfig, DomainError> {
        StoreFactory::config_for(
            &self.backend,
            self.database_url.as_deref(),
            self.max_connections,
        )
    }
}

impl EndpointsConfig {
    pub fn embed_url(&self) -> Result<&str, DomainError> {
        required("endpoints.embed_url", self.embed_url.as_deref())
    }

    pub fn generate_url(&self) -> Result<&str, DomainError> {
        required("endpoints.generate_url", self.generate_url.as_deref())
    }
}

impl SymptomsConfig {
    pub fn catalog(&self) -> Result<SymptomCatalog, DomainError> {
        SymptomCatalog::new(
            self.drugs.clone(),
            self.aliases
                .iter()
                .map(|alias| (alias.pattern.clone(), alias.symptom.clone())),
        )
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, DomainError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::configuration(format!("{} is required", name)))
}

impl AppConfig {
    /// Loads `config/default`, `config/local` and `APP__*` environment
    /// variables, in increasing precedence
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Checks every value needed to build the application
    pub fn validate(&self) -> Result<(), DomainError> {
        self.retry.validate()?;

        if self.cache.max_size == 0 {
            return Err(DomainError::configuration("cache.max_size must be at least 1"));
        }
        if self.cache.expiry_days == 0 {
            return Err(DomainError::configuration("cache.expiry_days must be at least 1"));
        }
        if self.cache.expiry_days > MAX_CACHE_EXPIRY_DAYS {
            return Err(DomainError::configuration(format!(
                "cache.expiry_days must be at most {}, got {}",
                MAX_CACHE_EXPIRY_DAYS, self.cache.expiry_days
            )));
        }
        if !(0.0..=1.0).contains(&self.store.hybrid_alpha) {
            return Err(DomainError::configuration(format!(
                "store.hybrid_alpha must be within [0, 1], got {}",
                self.store.hybrid_alpha
            )));
        }

        self.store.to_store_config()?;
        self.endpoints.embed_url()?;
        self.endpoints.generate_url()?;
        self.symptoms.catalog()?;

        Ok(())
    }
}
