pub mod analyze;
pub mod ensemble;
pub mod merge;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

#[derive(Parser)]
#[command(
    name = "quorum",
    about = "Ensemble, merge, and validate entity/relation extraction results",
    version
)]
pub struct Cli {
    /// Accept entities with an empty mention list
    #[arg(long, global = true)]
    pub allow_empty_mentions: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check prediction and reference files before scoring
    Validate {
        /// Prediction file
        #[arg(short, long, default_value = "results.json")]
        prediction: PathBuf,
        /// Reference file
        #[arg(short, long, default_value = "reference.json")]
        reference: PathBuf,
    },
    /// Union result files, deduplicating entities and triples per document
    Merge {
        /// Result files, in priority order for titles
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Combined output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Vote across result files, one producer per file
    Ensemble {
        /// Result files, one per producer
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Ensembled output file
        #[arg(short, long)]
        output: PathBuf,
        /// Producers that must agree on an entity
        #[arg(long = "entity-votes")]
        entity_votes: Option<usize>,
        /// Producers that must agree on a triple
        #[arg(long = "triple-votes")]
        triple_votes: Option<usize>,
        /// Candidate triples to filter against the confirmed entities
        #[arg(long)]
        refine: Option<PathBuf>,
        /// Keep the voted triples instead of refining them
        #[arg(long, conflicts_with = "refine")]
        single_stage: bool,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report how many entities and triples deduplication would remove
    Analyze {
        /// Result files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn pass(message: impl std::fmt::Display) {
    eprintln!("  {} {message}", style("✓").green());
}

fn fail(message: impl std::fmt::Display) {
    eprintln!("  {} {message}", style("✗").red().bold());
}

fn section(title: &str) {
    eprintln!();
    eprintln!("{}", style(format!("-- {title} --")).bold());
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().to_string(),
    )
}
