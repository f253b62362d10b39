//! Domain layer - Core types and collaborator traits

pub mod cache;
pub mod collection;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod generation;
pub mod patient;
pub mod plan;
pub mod retrieval;
pub mod retry;
pub mod store;
pub mod template;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use collection::{CollectionDescriptor, EntityKind, QueryParameters};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use fetch::DocumentFetcher;
pub use generation::{SamplingParams, TextGenerator};
pub use patient::{AgeGroup, PatientProfile, SymptomCatalog};
pub use plan::{DrugFindings, PlanContext, PlanSections};
pub use retrieval::{PayloadKind, RetrievalResult, Tier};
pub use retry::{RetryExecutor, RetryPolicy, Sleeper};
pub use store::{HybridQuery, Properties, VectorStore};
pub use template::{Template, TemplateError};
