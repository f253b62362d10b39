//! Dosage Guidance
//!
//! Tiered dosage and food-interaction lookup with mitigation plan generation:
//! - Vector store, bounded expiring cache and live fetch consulted in order
//! - Validity gating and write-back of freshly derived values
//! - Retry with exponential backoff at every fallible call site
//! - Plan generation with format validation, caching and a deterministic fallback

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use domain::collection::EntityKind;
use domain::patient::SymptomCatalog;
use domain::retry::RetryExecutor;
use domain::store::VectorStore;
use infrastructure::{
    cache::{CacheFactory, CacheSet},
    embedding::{CachedEmbeddingProvider, HttpEmbeddingProvider},
    fetch::HttpDocumentFetcher,
    generation::HttpTextGenerator,
    http::HttpClient,
    services::{PlanService, RetrievalService},
    store::StoreFactory,
};
use tracing::{info, warn};

/// Everything a command needs, built once per process
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub catalog: SymptomCatalog,
    pub store: Arc<dyn VectorStore>,
    pub caches: CacheSet,
    pub retrieval: RetrievalService,
    pub plans: PlanService,
}

/// Validate the configuration, open the caches, connect the store and wire
/// the services
pub async fn create_app_context(config: AppConfig) -> anyhow::Result<AppContext> {
    config.validate()?;

    let catalog = config.symptoms.catalog()?;

    let caches = CacheFactory::open_all(&config.cache.to_cache_config()).await;
    info!(dir = %config.cache.dir.display(), "Caches opened");

    let store_retry = RetryExecutor::new(config.retry.store);
    let store = connect_store(&config, &store_retry).await?;

    let embed_client =
        HttpClient::with_timeout(Duration::from_secs(config.endpoints.embed_timeout_secs))?;
    let embeddings = CachedEmbeddingProvider::new(
        Arc::new(HttpEmbeddingProvider::new(
            embed_client,
            config.endpoints.embed_url()?,
            config.endpoints.embed_max_length,
        )),
        caches.embeddings.clone(),
    );

    let fetch_client =
        HttpClient::with_timeout(Duration::from_secs(config.endpoints.fetch_timeout_secs))?;
    let fetcher = HttpDocumentFetcher::new(fetch_client, RetryExecutor::new(config.retry.fetch))
        .with_status_forcelist(config.retry.status_forcelist.clone());

    let retrieval = RetrievalService::new(
        store.clone(),
        caches.scraped.clone(),
        Arc::new(embeddings),
        Arc::new(fetcher),
        store_retry,
    )
    .with_hybrid_alpha(config.store.hybrid_alpha);

    let generate_client =
        HttpClient::with_timeout(Duration::from_secs(config.endpoints.generate_timeout_secs))?;
    let generator = HttpTextGenerator::new(generate_client, config.endpoints.generate_url()?);
    let plans = PlanService::new(
        Arc::new(generator),
        caches.plans.clone(),
        RetryExecutor::new(config.retry.generation),
    )?;

    Ok(AppContext {
        config,
        catalog,
        store,
        caches,
        retrieval,
        plans,
    })
}

async fn connect_store(
    config: &AppConfig,
    retry: &RetryExecutor,
) -> anyhow::Result<Arc<dyn VectorStore>> {
    let store = StoreFactory::create(&config.store.to_store_config()?);
    info!(backend = store.provider_type(), "Connecting to vector store...");

    let descriptors = EntityKind::all_descriptors();
    let store_ref = &store;
    let descriptors_ref = &descriptors;

    retry
        .run("vector_store.connect", || async move { store_ref.connect().await })
        .await?;
    retry
        .run("vector_store.ensure_schema", || async move {
            store_ref.ensure_schema(descriptors_ref).await
        })
        .await?;

    info!(backend = store.provider_type(), "Vector store ready");
    Ok(store)
}

impl AppContext {
    /// Flush every cache snapshot and close the store. Both steps always
    /// run; the first failure is returned.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        let flushed = self.caches.flush_all().await;
        let closed = self.store.close().await;

        if let Err(e) = &closed {
            warn!(error = %e, "Failed to close vector store");
        }

        flushed?;
        closed?;

        info!("Shutdown complete");
        Ok(())
    }
}
