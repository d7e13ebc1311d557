use std::collections::HashSet;

use crate::identity::normalize;
use crate::record::{Entity, Triple};

/// Keep only triples whose head and tail both match, after normalization,
/// some mention of a confirmed entity. Dropped triples are expected and are
/// not errors.
#[must_use]
pub fn refine_triples(candidates: Vec<Triple>, confirmed: &[Entity]) -> Vec<Triple> {
    let known: HashSet<String> = confirmed
        .iter()
        .flat_map(|e| e.mentions.iter())
        .map(|m| normalize(m))
        .collect();

    let before = candidates.len();
    let kept: Vec<Triple> = candidates
        .into_iter()
        .filter(|t| known.contains(&normalize(&t.head)) && known.contains(&normalize(&t.tail)))
        .collect();

    if kept.len() < before {
        tracing::debug!(
            "Refinement dropped {} of {} candidate triples",
            before - kept.len(),
            before
        );
    }
    kept
}
