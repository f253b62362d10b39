//! CLI module for Dosage Guidance
//!
//! Provides subcommands:
//! - `plan`: mitigation plan for a symptom, age and weight
//! - `dosage`: single dosage lookup
//! - `interactions`: single food/alcohol interaction lookup

pub mod lookup;
pub mod plan;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::AppContext;

/// Dosage Guidance - Dosage and interaction lookup with plan generation
#[derive(Parser)]
#[command(name = "dosage-guidance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a dosage and interaction plan for a patient
    Plan(plan::PlanArgs),

    /// Look up dosage for one drug
    Dosage(lookup::DosageArgs),

    /// Look up food and alcohol interactions for one drug
    Interactions(lookup::InteractionsArgs),
}

/// Load configuration, start logging and build the application context
async fn bootstrap() -> anyhow::Result<AppContext> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    crate::create_app_context(config).await
}
