use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::identity::{ExactTripleKey, MentionSetKey};
use crate::record::Payload;

/// Before/after deduplication counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupCounts {
    pub entities_total: usize,
    pub entities_unique: usize,
    pub triples_total: usize,
    pub triples_unique: usize,
}

impl DedupCounts {
    #[must_use]
    pub fn duplicate_entities(&self) -> usize {
        self.entities_total.saturating_sub(self.entities_unique)
    }

    #[must_use]
    pub fn duplicate_triples(&self) -> usize {
        self.triples_total.saturating_sub(self.triples_unique)
    }

    fn add(&mut self, other: Self) {
        self.entities_total += other.entities_total;
        self.entities_unique += other.entities_unique;
        self.triples_total += other.triples_total;
        self.triples_unique += other.triples_unique;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub documents: BTreeMap<String, DedupCounts>,
    pub total: DedupCounts,
}

/// Count how much the merger's dedup rules would collapse across `payloads`.
/// Read-only; nothing is merged.
#[must_use]
pub fn analyze_and_combine<'a>(payloads: impl IntoIterator<Item = &'a Payload>) -> AnalysisReport {
    let mut seen: BTreeMap<&str, (BTreeSet<MentionSetKey>, BTreeSet<ExactTripleKey>)> =
        BTreeMap::new();
    let mut report = AnalysisReport::default();

    for payload in payloads {
        for (doc_id, record) in payload {
            let counts = report.documents.entry(doc_id.clone()).or_default();
            counts.entities_total += record.entities.len();
            counts.triples_total += record.triples.len();

            let (entities, triples) = seen.entry(doc_id.as_str()).or_default();
            entities.extend(record.entities.iter().filter_map(MentionSetKey::of));
            triples.extend(record.triples.iter().map(ExactTripleKey::of));
        }
    }

    for (doc_id, (entities, triples)) in seen {
        if let Some(counts) = report.documents.get_mut(doc_id) {
            counts.entities_unique = entities.len();
            counts.triples_unique = triples.len();
            report.total.add(*counts);
        }
    }

    report
}
