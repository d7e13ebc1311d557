//! Cross-producer voting for a single document.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::EnsembleConfig;
use crate::extract::{parse_output_lossy, Contribution, RawOutput};
use crate::identity::{EndpointKey, RepresentativeKey};
use crate::record::{DocumentRecord, Entity, Triple};

/// Label counts for majority selection.
#[derive(Debug, Default)]
struct Histogram(BTreeMap<String, usize>);

impl Histogram {
    fn add(&mut self, label: &str) {
        *self.0.entry(label.to_string()).or_default() += 1;
    }

    /// Most frequent label; ties go to the lexicographically smallest.
    fn majority(&self) -> Option<&str> {
        self.0
            .iter()
            .max_by(|(a_label, a_count), (b_label, b_count)| {
                a_count.cmp(b_count).then_with(|| b_label.cmp(a_label))
            })
            .map(|(label, _)| label.as_str())
    }
}

#[derive(Debug, Default)]
struct EntityTally<'a> {
    voters: BTreeSet<&'a str>,
    types: Histogram,
    mentions: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct TripleTally<'a> {
    voters: BTreeSet<&'a str>,
    relations: Histogram,
}

/// Quorum voting over entities and triples proposed by several producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ensembler {
    entity_min_votes: usize,
    triple_min_votes: usize,
}

impl Default for Ensembler {
    fn default() -> Self {
        Self::new(2, 2)
    }
}

impl Ensembler {
    #[must_use]
    pub fn new(entity_min_votes: usize, triple_min_votes: usize) -> Self {
        Self {
            entity_min_votes,
            triple_min_votes,
        }
    }

    #[must_use]
    pub fn from_config(config: &EnsembleConfig) -> Self {
        Self::new(config.entity_min_votes, config.triple_min_votes)
    }

    /// Parse each producer's raw output and vote. Unparsable outputs count as
    /// empty contributions.
    #[must_use]
    pub fn combine(&self, title: &str, outputs: &BTreeMap<String, RawOutput>) -> DocumentRecord {
        let contributions: BTreeMap<String, Contribution> = outputs
            .iter()
            .map(|(producer, raw)| (producer.clone(), parse_output_lossy(producer, raw)))
            .collect();
        self.combine_contributions(title, &contributions)
    }

    #[must_use]
    pub fn combine_contributions(
        &self,
        title: &str,
        contributions: &BTreeMap<String, Contribution>,
    ) -> DocumentRecord {
        let entities = self.ensemble_entities(contributions);
        let triples = self.ensemble_triples(contributions);

        tracing::debug!(
            "Ensembled {} producers into {} entities and {} triples",
            contributions.len(),
            entities.len(),
            triples.len()
        );

        DocumentRecord {
            title: title.to_string(),
            entities,
            triples,
        }
    }

    /// Entities whose representative mention is proposed by at least
    /// `entity_min_votes` producers.
    #[must_use]
    pub fn ensemble_entities(&self, contributions: &BTreeMap<String, Contribution>) -> Vec<Entity> {
        let mut tallies: HashMap<RepresentativeKey, EntityTally<'_>> = HashMap::new();

        for (producer, contribution) in contributions {
            for entity in &contribution.entities {
                let Some(key) = RepresentativeKey::of(entity) else {
                    continue;
                };
                let tally = tallies.entry(key).or_default();
                tally.voters.insert(producer.as_str());
                tally.types.add(&entity.entity_type);
                tally.mentions.extend(entity.mentions.iter().cloned());
            }
        }

        let mut selected: Vec<Entity> = tallies
            .into_values()
            .filter(|tally| tally.voters.len() >= self.entity_min_votes)
            .filter_map(|tally| {
                let entity_type = tally.types.majority()?.to_string();
                Some(Entity::new(tally.mentions.into_iter().collect(), entity_type))
            })
            .collect();

        selected.sort_by(Entity::canonical_cmp);
        selected
    }

    /// Triples whose normalized head/tail pair is proposed by at least
    /// `triple_min_votes` producers. Emitted head and tail are normalized.
    #[must_use]
    pub fn ensemble_triples(&self, contributions: &BTreeMap<String, Contribution>) -> Vec<Triple> {
        let mut tallies: BTreeMap<EndpointKey, TripleTally<'_>> = BTreeMap::new();

        for (producer, contribution) in contributions {
            for triple in &contribution.triples {
                let tally = tallies.entry(EndpointKey::of(triple)).or_default();
                tally.voters.insert(producer.as_str());
                tally.relations.add(&triple.relation);
            }
        }

        let mut selected: Vec<Triple> = tallies
            .into_iter()
            .filter(|(_, tally)| tally.voters.len() >= self.triple_min_votes)
            .filter_map(|(key, tally)| {
                let relation = tally.relations.majority()?.to_string();
                Some(Triple::new(key.head, relation, key.tail))
            })
            .collect();

        selected.sort_by(Triple::canonical_cmp);
        selected
    }
}
