//! Lookup commands - single tiered retrievals

use clap::Args;
use tracing::info;

use crate::domain::patient::{sanitize_input, AgeGroup};
use crate::domain::retrieval::RetrievalResult;
use crate::infrastructure::services::RetrievalService;

#[derive(Debug, Clone, Args)]
pub struct DosageArgs {
    #[arg(long)]
    pub drug: String,

    #[arg(long)]
    pub symptom: String,

    /// `pediatric` or `adult`
    #[arg(long, default_value = "adult")]
    pub age_group: AgeGroup,
}

#[derive(Debug, Clone, Args)]
pub struct InteractionsArgs {
    #[arg(long)]
    pub drug: String,
}

/// Run the dosage command
pub async fn run_dosage(args: DosageArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let result = dosage(&context.retrieval, &args).await;
    report(&result);

    let shutdown = context.shutdown().await;
    result?;
    shutdown
}

/// Run the interactions command
pub async fn run_interactions(args: InteractionsArgs) -> anyhow::Result<()> {
    let context = super::bootstrap().await?;

    let result = interactions(&context.retrieval, &args).await;
    report(&result);

    let shutdown = context.shutdown().await;
    result?;
    shutdown
}

pub async fn dosage(retrieval: &RetrievalService, args: &DosageArgs) -> anyhow::Result<RetrievalResult> {
    let drug = sanitize_input(&args.drug);
    let symptom = sanitize_input(&args.symptom);

    Ok(retrieval.dosage(&drug, &symptom, args.age_group).await?)
}

pub async fn interactions(
    retrieval: &RetrievalService,
    args: &InteractionsArgs,
) -> anyhow::Result<RetrievalResult> {
    let drug = sanitize_input(&args.drug);

    Ok(retrieval.interactions(&drug).await?)
}

fn report(result: &anyhow::Result<RetrievalResult>) {
    if let Ok(result) = result {
        info!(tier = %result.tier, kind = ?result.kind, "Lookup complete");
        println!("{}", result);
    }
}
