use std::path::PathBuf;

use anyhow::{bail, Result};

use quorum_core::{analyze_and_combine, read_payload, DedupCounts, Payload, ValidationOptions};

use super::{fail, file_label, pass, section};

pub fn run(inputs: &[PathBuf], options: ValidationOptions) -> Result<()> {
    section("Loading");
    let payloads: Vec<Payload> = inputs
        .iter()
        .filter_map(|path| match read_payload(path, options) {
            Ok(payload) => {
                pass(file_label(path));
                Some(payload)
            }
            Err(e) => {
                fail(e);
                None
            }
        })
        .collect();

    if payloads.is_empty() {
        bail!("no readable input files");
    }

    let report = analyze_and_combine(&payloads);

    section("Per Document");
    for (doc_id, counts) in &report.documents {
        print_counts(doc_id, counts);
    }

    section("Total");
    print_counts("all documents", &report.total);
    Ok(())
}

fn print_counts(label: &str, counts: &DedupCounts) {
    eprintln!(
        "  {label}: entities {} -> {} (-{}), triples {} -> {} (-{})",
        counts.entities_total,
        counts.entities_unique,
        counts.duplicate_entities(),
        counts.triples_total,
        counts.triples_unique,
        counts.duplicate_triples()
    );
}
