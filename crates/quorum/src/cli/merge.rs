use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use quorum_core::{merge_files, write_payload, MergeReport, ValidationOptions};

use super::{fail, pass, section};

pub fn run(inputs: &[PathBuf], output: &Path, options: ValidationOptions) -> Result<()> {
    section("Merging");
    let (payload, report) = merge_files(inputs, options);

    write_payload(output, &payload)
        .with_context(|| format!("failed to write {}", output.display()))?;

    print_report(&report);
    eprintln!();
    eprintln!(
        "{} Combined results written to {}",
        style("●").green(),
        style(output.display()).bold()
    );
    Ok(())
}

fn print_report(report: &MergeReport) {
    for source in &report.used {
        pass(source);
    }
    for skipped in &report.skipped {
        fail(format!("{}: {}", skipped.source, skipped.reason));
    }

    eprintln!();
    eprintln!("Used {} of {} sources", report.used.len(), report.supplied);
    eprintln!("  Documents: {}", report.documents);
    eprintln!("  Unique entities: {}", report.unique_entities);
    eprintln!("  Unique triples: {}", report.unique_triples);

    if !report.untitled.is_empty() {
        eprintln!(
            "  {} No title found for: {}",
            style("!").yellow(),
            report.untitled.join(", ")
        );
    }
}
