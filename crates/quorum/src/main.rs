use anyhow::Result;
use clap::Parser;

use quorum::cli::ensemble::EnsembleArgs;
use quorum::cli::{Cli, Commands};
use quorum_core::ValidationOptions;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ValidationOptions {
        allow_empty_mentions: cli.allow_empty_mentions,
    };

    match cli.command {
        Commands::Validate {
            prediction,
            reference,
        } => quorum::cli::validate::run(&prediction, &reference, options),
        Commands::Merge { inputs, output } => quorum::cli::merge::run(&inputs, &output, options),
        Commands::Ensemble {
            inputs,
            output,
            entity_votes,
            triple_votes,
            refine,
            single_stage,
            config,
        } => {
            let args = EnsembleArgs {
                inputs: &inputs,
                output: &output,
                entity_votes,
                triple_votes,
                refine: refine.as_deref(),
                single_stage,
                config: config.as_deref(),
            };
            quorum::cli::ensemble::run(args, options).await
        }
        Commands::Analyze { inputs } => quorum::cli::analyze::run(&inputs, options),
    }
}
