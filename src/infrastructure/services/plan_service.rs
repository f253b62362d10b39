//! Mitigation plan generation with format validation and caching

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::cache::{Cache, CacheKeyGenerator, DefaultKeyGenerator};
use crate::domain::generation::{SamplingParams, TextGenerator};
use crate::domain::plan::{parse_plan, PlanContext};
use crate::domain::retry::{RetryExecutor, RetryPolicy};
use crate::domain::DomainError;

const PLAN_NAMESPACE: &str = "plan";

/// Attempts against the format contract before falling back
pub const PLAN_ATTEMPTS: u32 = 3;

/// Backoff factor between plan attempts, in seconds
pub const PLAN_BACKOFF_FACTOR: f64 = 0.5;

/// Where a plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Cached,
    Generated,
    Fallback,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => write!(f, "cached"),
            Self::Generated => write!(f, "generated"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A formatted two-section plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub text: String,
    pub source: PlanSource,
}

/// Generates plans through the text generator, validating each response
/// against the two-paragraph contract.
///
/// Plans are cached under a hash of the full clinical input. After the
/// attempts run out a deterministic fallback plan is built from the
/// condensed findings and cached like any other plan.
#[derive(Debug)]
pub struct PlanService {
    generator: Arc<dyn TextGenerator>,
    cache: Arc<dyn Cache>,
    generation_retry: RetryExecutor,
    attempt_retry: RetryExecutor,
    sampling: SamplingParams,
    key_generator: DefaultKeyGenerator,
}

impl PlanService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cache: Arc<dyn Cache>,
        generation_retry: RetryExecutor,
    ) -> Result<Self, DomainError> {
        let attempt_retry = RetryExecutor::new(RetryPolicy::new(PLAN_ATTEMPTS, PLAN_BACKOFF_FACTOR)?);

        Ok(Self {
            generator,
            cache,
            generation_retry,
            attempt_retry,
            sampling: SamplingParams::precise(),
            key_generator: DefaultKeyGenerator::hashed(),
        })
    }

    /// Replaces the executor driving whole plan attempts
    pub fn with_attempt_retry(mut self, retry: RetryExecutor) -> Self {
        self.attempt_retry = retry;
        self
    }

    /// Plan cache key for `context`
    pub fn cache_key(&self, context: &PlanContext) -> String {
        self.key_generator
            .generate_with_namespace(PLAN_NAMESPACE, &context.cache_params())
    }

    pub async fn generate_plan(&self, context: &PlanContext) -> Result<GeneratedPlan, DomainError> {
        let prompt = context.prompt()?;
        let key = self.cache_key(context);

        match self.cache.get(&key).await {
            Ok(Some(text)) => {
                info!(key = %key, "Plan cache hit");
                return Ok(GeneratedPlan {
                    text,
                    source: PlanSource::Cached,
                });
            }
            Ok(None) => debug!(key = %key, "Plan cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Plan cache lookup failed, treating as miss"),
        }

        let plan = match self.generate_validated(&prompt).await {
            Ok(text) => GeneratedPlan {
                text,
                source: PlanSource::Generated,
            },
            Err(e) => {
                warn!(error = %e, cause = %e.root_cause(), "Plan generation failed, using fallback plan");
                GeneratedPlan {
                    text: context.fallback().render(),
                    source: PlanSource::Fallback,
                }
            }
        };

        if let Err(e) = self.cache.put(&key, &plan.text).await {
            warn!(key = %key, error = %e, "Failed to cache plan");
        }

        info!(source = %plan.source, "Plan ready");
        Ok(plan)
    }

    async fn generate_validated(&self, prompt: &str) -> Result<String, DomainError> {
        let generator = &self.generator;
        let generation_retry = &self.generation_retry;
        let sampling = &self.sampling;

        self.attempt_retry
            .run("plan.generate", || async move {
                let raw = generation_retry
                    .run("generation.generate", move || async move {
                        generator.generate(prompt, sampling).await
                    })
                    .await?;

                let sections = parse_plan(&raw).map_err(|e| {
                    debug!(error = %e, "Generated plan rejected");
                    DomainError::generation(format!("Malformed plan: {}", e))
                })?;

                Ok(sections.render())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::mock::MockCache;
    use crate::domain::generation::mock::MockTextGenerator;
    use crate::domain::plan::DrugFindings;
    use crate::domain::patient::PatientProfile;
    use crate::domain::retry::mock::{instant_executor, RecordingSleeper};
    use std::time::Duration;

    const VALID_PLAN: &str = "assistant\nHello! Give Acetaminophen 325 to 650 mg every 4 to 6 hours. Follow doctor’s advice!\n\nCaution! Avoid alcohol with Acetaminophen. Consult a doctor!";

    fn context() -> PlanContext {
        PlanContext::new(
            PatientProfile::new("fever", 30, Some(70.0)).unwrap(),
            DrugFindings::new(
                "acetaminophen",
                "Oral: 325 to 650 mg every 4 to 6 hours as needed, not to exceed 4 doses in 24 hours",
                "Major Interaction: Acetaminophen Alcohol (Ethanol)\nAlcohol may cause liver damage.",
            ),
            DrugFindings::new(
                "ibuprofen",
                "Oral: 200 to 400 mg every 4 to 6 hours, not to exceed 6 doses in 24 hours",
                "No food/alcohol interactions found.",
            ),
        )
    }

    fn service(
        generator: Arc<MockTextGenerator>,
        cache: Arc<MockCache>,
        sleeper: Arc<RecordingSleeper>,
    ) -> PlanService {
        let attempts =
            RetryExecutor::with_sleeper(RetryPolicy::new(PLAN_ATTEMPTS, PLAN_BACKOFF_FACTOR).unwrap(), sleeper);

        PlanService::new(generator, cache, instant_executor(3, 0.2))
            .unwrap()
            .with_attempt_retry(attempts)
    }

    #[tokio::test]
    async fn test_valid_plan_is_rendered_and_cached() {
        let generator = Arc::new(MockTextGenerator::returning(VALID_PLAN));
        let cache = Arc::new(MockCache::new());
        let service = service(generator.clone(), cache.clone(), Arc::new(RecordingSleeper::new()));

        let plan = service.generate_plan(&context()).await.unwrap();

        assert_eq!(plan.source, PlanSource::Generated);
        assert_eq!(
            plan.text,
            "Dosage Plan:\nHello! Give Acetaminophen 325 to 650 mg every 4 to 6 hours. Follow doctor’s advice!\n\n\
             Interaction Plan:\nCaution! Avoid alcohol with Acetaminophen. Consult a doctor!"
        );
        assert_eq!(generator.call_count(), 1);
        assert_eq!(
            cache.puts(),
            vec![(service.cache_key(&context()), plan.text.clone())]
        );
    }

    #[tokio::test]
    async fn test_identical_request_is_served_from_cache() {
        let generator = Arc::new(MockTextGenerator::returning(VALID_PLAN));
        let cache = Arc::new(MockCache::new());
        let service = service(generator.clone(), cache, Arc::new(RecordingSleeper::new()));

        let first = service.generate_plan(&context()).await.unwrap();
        let second = service.generate_plan(&context()).await.unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(second.source, PlanSource::Cached);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_paragraph_falls_back_after_three_attempts() {
        let generator = Arc::new(MockTextGenerator::returning(
            "Hello! Give Acetaminophen 500 mg. Follow doctor’s advice!",
        ));
        let cache = Arc::new(MockCache::new());
        let sleeper = Arc::new(RecordingSleeper::new());
        let service = service(generator.clone(), cache.clone(), sleeper.clone());

        let plan = service.generate_plan(&context()).await.unwrap();

        assert_eq!(plan.source, PlanSource::Fallback);
        assert_eq!(generator.call_count(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );

        let [a, b] = context().summaries();
        assert!(plan.text.contains("Acetaminophen"));
        assert!(plan.text.contains("Ibuprofen"));
        assert!(plan.text.contains(&a.dosage));
        assert!(plan.text.contains(&b.dosage));
        assert_eq!(plan.text, context().fallback().render());

        assert_eq!(cache.puts().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_plan_is_not_regenerated() {
        let generator = Arc::new(MockTextGenerator::returning("not a plan"));
        let cache = Arc::new(MockCache::new());
        let service = service(generator.clone(), cache, Arc::new(RecordingSleeper::new()));

        let first = service.generate_plan(&context()).await.unwrap();
        let second = service.generate_plan(&context()).await.unwrap();

        assert_eq!(first.source, PlanSource::Fallback);
        assert_eq!(second.source, PlanSource::Cached);
        assert_eq!(second.text, first.text);
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transient_generation_error_is_retried_within_attempt() {
        let generator = Arc::new(
            MockTextGenerator::new()
                .then_fail("502 Bad Gateway")
                .then_return(VALID_PLAN),
        );
        let sleeper = Arc::new(RecordingSleeper::new());
        let service = service(generator.clone(), Arc::new(MockCache::new()), sleeper.clone());

        let plan = service.generate_plan(&context()).await.unwrap();

        assert_eq!(plan.source, PlanSource::Generated);
        assert_eq!(generator.call_count(), 2);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_then_valid_plan_succeeds() {
        let generator = Arc::new(
            MockTextGenerator::new()
                .then_return("Hello!\nCaution!")
                .then_return(VALID_PLAN),
        );
        let sleeper = Arc::new(RecordingSleeper::new());
        let service = service(generator.clone(), Arc::new(MockCache::new()), sleeper.clone());

        let plan = service.generate_plan(&context()).await.unwrap();

        assert_eq!(plan.source, PlanSource::Generated);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_prompt_carries_condensed_findings() {
        let generator = Arc::new(MockTextGenerator::returning(VALID_PLAN));
        let service = service(generator.clone(), Arc::new(MockCache::new()), Arc::new(RecordingSleeper::new()));

        service.generate_plan(&context()).await.unwrap();

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Acetaminophen"));
        assert!(prompts[0].contains("Ibuprofen"));
    }

    #[tokio::test]
    async fn test_cache_errors_do_not_fail_generation() {
        let generator = Arc::new(MockTextGenerator::returning(VALID_PLAN));
        let cache = Arc::new(MockCache::new().with_error("read-only"));
        let service = service(generator.clone(), cache, Arc::new(RecordingSleeper::new()));

        let plan = service.generate_plan(&context()).await.unwrap();

        assert_eq!(plan.source, PlanSource::Generated);
    }

    #[test]
    fn test_cache_key_is_namespaced_hash() {
        let service = service(
            Arc::new(MockTextGenerator::new()),
            Arc::new(MockCache::new()),
            Arc::new(RecordingSleeper::new()),
        );

        let key = service.cache_key(&context());
        let hash = key.strip_prefix("plan:").unwrap();

        assert_eq!(hash.len(), 64);
        assert_eq!(key, service.cache_key(&context()));
    }
}
