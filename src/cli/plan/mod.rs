//! Plan command - patient plan from the suggested drug pair

use clap::Args;
use tracing::info;

use crate::domain::patient::{PatientProfile, SymptomCatalog, MAX_AGE};
use crate::domain::plan::{DrugFindings, PlanContext};
use crate::infrastructure::services::{GeneratedPlan, PlanService, RetrievalService};

pub const DISCLAIMER: &str =
    "⚠️ This is not a substitute for professional medical advice. Always consult a doctor.";

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Symptom, e.g. "fever" or "headache"
    #[arg(long)]
    pub symptom: String,

    /// Age in years
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_AGE as i64))]
    pub age: u32,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<f64>,
}

/// Run the plan command
pub async fn run(args: PlanArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let result = build_plan(&context.catalog, &context.retrieval, &context.plans, &args).await;

    if let Ok(plan) = &result {
        println!("{}", render_output(plan));
    }

    let shutdown = context.shutdown().await;
    result?;
    shutdown
}

/// Resolve the symptom, retrieve findings for both drugs and generate the plan
pub async fn build_plan(
    catalog: &SymptomCatalog,
    retrieval: &RetrievalService,
    plans: &PlanService,
    args: &PlanArgs,
) -> anyhow::Result<GeneratedPlan> {
    let symptom = catalog.normalize(&args.symptom)?;
    let drugs = catalog
        .drugs_for(&symptom)
        .ok_or_else(|| anyhow::anyhow!("No drugs configured for symptom '{}'", symptom))?
        .clone();

    let patient = PatientProfile::new(symptom, args.age, args.weight)?;
    info!(
        symptom = %patient.symptom,
        age_group = %patient.age_group(),
        drug_a = %drugs[0],
        drug_b = %drugs[1],
        "Building plan"
    );

    let mut findings = Vec::with_capacity(drugs.len());
    for drug in &drugs {
        let dosage = retrieval
            .dosage(drug, &patient.symptom, patient.age_group())
            .await?;
        let interactions = retrieval.interactions(drug).await?;

        findings.push(DrugFindings::new(
            drug.as_str(),
            dosage.into_value(),
            interactions.into_value(),
        ));
    }

    let [first, second]: [DrugFindings; 2] = findings
        .try_into()
        .map_err(|_| anyhow::anyhow!("Expected findings for two drugs"))?;

    let plan = plans
        .generate_plan(&PlanContext::new(patient, first, second))
        .await?;

    Ok(plan)
}

/// Plan text followed by the medical disclaimer
pub fn render_output(plan: &GeneratedPlan) -> String {
    format!("{}\n\n{}", plan.text, DISCLAIMER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::cache::mock::MockCache;
    use crate::domain::embedding::mock::MockEmbeddingProvider;
    use crate::domain::fetch::mock::MockDocumentFetcher;
    use crate::domain::generation::mock::MockTextGenerator;
    use crate::domain::retry::mock::instant_executor;
    use crate::domain::store::mock::MockVectorStore;
    use crate::domain::DomainError;
    use crate::infrastructure::services::PlanSource;

    const VALID_PLAN: &str = "Hello! Give Acetaminophen 325 mg every 4 hours. Follow doctor’s advice!\nCaution! Avoid alcohol. Consult a doctor!";

    fn catalog() -> SymptomCatalog {
        SymptomCatalog::new(
            [(
                "pain".to_string(),
                vec!["acetaminophen".to_string(), "aspirin".to_string()],
            )],
            [("headache".to_string(), "pain".to_string())],
        )
        .unwrap()
    }

    struct Harness {
        fetcher: Arc<MockDocumentFetcher>,
        generator: Arc<MockTextGenerator>,
        retrieval: RetrievalService,
        plans: PlanService,
    }

    fn harness() -> Harness {
        let fetcher = Arc::new(MockDocumentFetcher::new());
        let generator = Arc::new(MockTextGenerator::returning(VALID_PLAN));

        let retrieval = RetrievalService::new(
            Arc::new(MockVectorStore::new()),
            Arc::new(MockCache::new()),
            Arc::new(MockEmbeddingProvider::new(4)),
            fetcher.clone(),
            instant_executor(3, 0.2),
        );
        let plans = PlanService::new(generator.clone(), Arc::new(MockCache::new()), instant_executor(3, 0.2))
            .unwrap()
            .with_attempt_retry(instant_executor(3, 0.5));

        Harness {
            fetcher,
            generator,
            retrieval,
            plans,
        }
    }

    fn args(symptom: &str, age: u32) -> PlanArgs {
        PlanArgs {
            symptom: symptom.to_string(),
            age,
            weight: Some(20.0),
        }
    }

    #[tokio::test]
    async fn test_build_plan_resolves_alias_and_queries_both_drugs() {
        let h = harness();

        let plan = build_plan(&catalog(), &h.retrieval, &h.plans, &args("Headache", 8))
            .await
            .unwrap();

        assert_eq!(plan.source, PlanSource::Generated);
        assert_eq!(h.generator.call_count(), 1);
        assert_eq!(
            h.fetcher.requests(),
            vec![
                "https://www.drugs.com/dosage/acetaminophen.html",
                "https://www.drugs.com/food-interactions/acetaminophen.html",
                "https://www.drugs.com/dosage/aspirin.html",
                "https://www.drugs.com/food-interactions/aspirin.html",
            ]
        );
        assert!(h.generator.prompts()[0].contains("8-year-old (20 kg) with pain"));
    }

    #[tokio::test]
    async fn test_unknown_symptom_is_rejected_before_lookup() {
        let h = harness();

        let err = build_plan(&catalog(), &h.retrieval, &h.plans, &args("sneezing", 30))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation { .. })
        ));
        assert_eq!(h.fetcher.fetch_count(), 0);
    }

    #[test]
    fn test_render_output_appends_disclaimer() {
        let plan = GeneratedPlan {
            text: "Dosage Plan:\nHello!".to_string(),
            source: PlanSource::Fallback,
        };

        let output = render_output(&plan);
        assert!(output.starts_with("Dosage Plan:"));
        assert!(output.ends_with(DISCLAIMER));
    }
}
