//! Text normalization and the identity keys the two pipelines hash on.
//!
//! The ensembler and the merger deliberately use different identity rules:
//! the ensembler groups by the normalized representative mention, while the
//! merger requires the exact mention set and type to match. Keep them
//! separate.

use std::collections::BTreeSet;

use crate::record::{Entity, Triple};

/// Lower-case and trim surrounding whitespace. Idempotent and total.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

/// Ensembler entity key: normalized representative (first) mention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepresentativeKey(pub String);

impl RepresentativeKey {
    /// `None` for an entity without mentions.
    #[must_use]
    pub fn of(entity: &Entity) -> Option<Self> {
        entity.representative().map(|m| Self(normalize(m)))
    }
}

/// Ensembler triple key: normalized `(head, tail)`. Relation is voted separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub head: String,
    pub tail: String,
}

impl EndpointKey {
    #[must_use]
    pub fn of(triple: &Triple) -> Self {
        Self {
            head: normalize(&triple.head),
            tail: normalize(&triple.tail),
        }
    }
}

/// Merger entity key: the full, unnormalized mention set plus type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MentionSetKey {
    pub entity_type: String,
    pub mentions: BTreeSet<String>,
}

impl MentionSetKey {
    /// `None` for an entity without mentions.
    #[must_use]
    pub fn of(entity: &Entity) -> Option<Self> {
        if entity.mentions.is_empty() {
            return None;
        }
        Some(Self {
            entity_type: entity.entity_type.clone(),
            mentions: entity.mentions.iter().cloned().collect(),
        })
    }

    #[must_use]
    pub fn into_entity(self) -> Entity {
        Entity::new(self.mentions.into_iter().collect(), self.entity_type)
    }
}

/// Merger triple key: the exact `(head, relation, tail)` tuple, unnormalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExactTripleKey {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl ExactTripleKey {
    #[must_use]
    pub fn of(triple: &Triple) -> Self {
        Self {
            head: triple.head.clone(),
            relation: triple.relation.clone(),
            tail: triple.tail.clone(),
        }
    }

    #[must_use]
    pub fn into_triple(self) -> Triple {
        Triple::new(self.head, self.relation, self.tail)
    }
}
