//! Union of several result payloads, deduplicated per document.
//!
//! No voting happens here: every distinct entity and triple survives once.
//! Identity is exact. Entities collapse only when their whole mention set and
//! type match, triples only when head, relation and tail match verbatim.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::identity::{ExactTripleKey, MentionSetKey};
use crate::record::{DocumentRecord, Payload};
use crate::storage::read_payload;
use crate::validate::ValidationOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub supplied: usize,
    pub used: Vec<String>,
    pub skipped: Vec<SkippedSource>,
    pub documents: usize,
    pub unique_entities: usize,
    pub unique_triples: usize,
    /// Documents for which no source supplied a title
    pub untitled: Vec<String>,
}

#[derive(Debug, Default)]
struct MergedDocument {
    title: Option<String>,
    entities: BTreeSet<MentionSetKey>,
    triples: BTreeSet<ExactTripleKey>,
}

#[derive(Debug, Default)]
pub struct Merger {
    documents: BTreeMap<String, MergedDocument>,
    report: MergeReport,
}

impl Merger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one validated payload in. Sources are consumed in call order,
    /// which decides which title wins.
    pub fn add_payload(&mut self, source: &str, payload: &Payload) {
        self.report.supplied += 1;
        self.report.used.push(source.to_string());

        for (doc_id, record) in payload {
            let merged = self.documents.entry(doc_id.clone()).or_default();

            if merged.title.is_none() && !record.title.is_empty() {
                merged.title = Some(record.title.clone());
            }

            for entity in &record.entities {
                match MentionSetKey::of(entity) {
                    Some(key) => {
                        merged.entities.insert(key);
                    }
                    None => tracing::debug!("Skipping entity without mentions in {}", doc_id),
                }
            }

            merged
                .triples
                .extend(record.triples.iter().map(ExactTripleKey::of));
        }
    }

    /// Read and fold in a payload file. An unreadable or invalid file is
    /// recorded as skipped and does not stop the merge.
    pub fn add_file(&mut self, path: &Path, options: ValidationOptions) -> bool {
        let source = path.display().to_string();
        match read_payload(path, options) {
            Ok(payload) => {
                tracing::info!("Merging {}", source);
                self.add_payload(&source, &payload);
                true
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", source, e);
                self.report.supplied += 1;
                self.report.skipped.push(SkippedSource {
                    source,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> (Payload, MergeReport) {
        let mut report = self.report;
        let mut payload = Payload::new();

        for (doc_id, merged) in self.documents {
            let title = merged.title.unwrap_or_else(|| {
                tracing::warn!("No source supplied a title for {}", doc_id);
                report.untitled.push(doc_id.clone());
                String::new()
            });

            let mut record = DocumentRecord {
                title,
                entities: merged
                    .entities
                    .into_iter()
                    .map(MentionSetKey::into_entity)
                    .collect(),
                triples: merged
                    .triples
                    .into_iter()
                    .map(ExactTripleKey::into_triple)
                    .collect(),
            };
            record.sort_canonical();

            report.unique_entities += record.entities.len();
            report.unique_triples += record.triples.len();
            payload.insert(doc_id, record);
        }

        report.documents = payload.len();
        (payload, report)
    }
}

/// Merge payload files in order, skipping the ones that fail to load.
#[must_use]
pub fn merge_files(paths: &[PathBuf], options: ValidationOptions) -> (Payload, MergeReport) {
    let mut merger = Merger::new();
    for path in paths {
        merger.add_file(path, options);
    }
    merger.finish()
}
