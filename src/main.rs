use clap::Parser;
use dosage_guidance::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => cli::plan::run(args).await,
        Command::Dosage(args) => cli::lookup::run_dosage(args).await,
        Command::Interactions(args) => cli::lookup::run_interactions(args).await,
    }
}
