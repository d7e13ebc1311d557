use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;

use quorum_core::{
    read_payload, write_payload, DocumentSample, EnsembleConfig, ExtractionPipeline, Extractor,
    Payload, StaticExtractor, ValidationOptions,
};

use super::{fail, pass, section};

pub struct EnsembleArgs<'a> {
    pub inputs: &'a [PathBuf],
    pub output: &'a Path,
    pub entity_votes: Option<usize>,
    pub triple_votes: Option<usize>,
    pub refine: Option<&'a Path>,
    pub single_stage: bool,
    pub config: Option<&'a Path>,
}

pub async fn run(args: EnsembleArgs<'_>, options: ValidationOptions) -> Result<()> {
    let config = load_config(&args)?;

    section("Loading producers");
    let producers = load_producers(args.inputs, options);
    if producers.is_empty() {
        bail!("no usable input files");
    }

    let samples = collect_samples(producers.values());
    let mut pipeline = ExtractionPipeline::new(config.clone())?;
    for (name, payload) in &producers {
        let extractor: Arc<dyn Extractor> = Arc::new(StaticExtractor::from_payload(name, payload)?);
        pipeline.add_extractor(extractor)?;
    }

    if let Some(path) = args.refine {
        let candidates = read_payload(path, options)
            .with_context(|| format!("failed to load candidate triples from {}", path.display()))?;
        pipeline = pipeline.with_refiner(Arc::new(StaticExtractor::from_payload(
            "candidates",
            &candidates,
        )?));
    }
    pipeline.ensure_refiner()?;

    let payload = Arc::new(pipeline).process_batch(samples).await;
    write_payload(args.output, &payload)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    eprintln!();
    eprintln!(
        "Ensembled {} documents from {} producers (entity quorum {}, triple quorum {}{})",
        payload.len(),
        producers.len(),
        config.entity_min_votes,
        config.triple_min_votes,
        if config.two_stage { ", refined" } else { "" }
    );
    eprintln!(
        "{} Results written to {}",
        style("●").green(),
        style(args.output.display()).bold()
    );
    Ok(())
}

fn load_config(args: &EnsembleArgs<'_>) -> Result<EnsembleConfig> {
    let mut config = match args.config {
        Some(path) => EnsembleConfig::from_file(path)?,
        None => EnsembleConfig::default(),
    }
    .with_env()?;

    if let Some(votes) = args.entity_votes {
        config.entity_min_votes = votes;
    }
    if let Some(votes) = args.triple_votes {
        config.triple_min_votes = votes;
    }
    if args.refine.is_some() {
        config.two_stage = true;
    } else if args.single_stage {
        config.two_stage = false;
    }
    config.validate()?;
    Ok(config)
}

/// One producer per readable input, named by file stem. A file listed
/// more than once is loaded once.
fn load_producers(inputs: &[PathBuf], options: ValidationOptions) -> BTreeMap<String, Payload> {
    let mut producers = BTreeMap::new();
    let mut seen = BTreeSet::new();
    for path in inputs {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if !seen.insert(canonical) {
            fail(format!("{} listed more than once; ignoring the repeat", path.display()));
            continue;
        }
        match read_payload(path, options) {
            Ok(payload) => {
                let name = producer_name(path, &producers);
                pass(&name);
                producers.insert(name, payload);
            }
            Err(e) => fail(e),
        }
    }
    producers
}

fn producer_name(path: &Path, taken: &BTreeMap<String, Payload>) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.is_empty() || taken.contains_key(&stem) {
        path.display().to_string()
    } else {
        stem
    }
}

/// Every document id seen in any producer, titled by the first non-empty title.
fn collect_samples<'a>(payloads: impl Iterator<Item = &'a Payload>) -> Vec<DocumentSample> {
    let mut titles: BTreeMap<&str, &str> = BTreeMap::new();
    let mut ids: BTreeSet<&str> = BTreeSet::new();

    for payload in payloads {
        for (doc_id, record) in payload {
            ids.insert(doc_id.as_str());
            if !record.title.is_empty() {
                titles.entry(doc_id.as_str()).or_insert(record.title.as_str());
            }
        }
    }

    ids.into_iter()
        .map(|id| DocumentSample::new(id, titles.get(id).copied().unwrap_or_default()))
        .collect()
}
