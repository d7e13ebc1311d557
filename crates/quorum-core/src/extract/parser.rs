use serde_json::{Map, Value};
use thiserror::Error;

use super::extractor::RawOutput;
use crate::record::{Entity, Triple};
use crate::validate::json_kind;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Output should be an object, got {0}")]
    NotAnObject(&'static str),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Entities and triples one producer proposed for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    pub entities: Vec<Entity>,
    pub triples: Vec<Triple>,
}

impl Contribution {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    #[must_use]
    pub fn with_triple(mut self, triple: Triple) -> Self {
        self.triples.push(triple);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.triples.is_empty()
    }
}

/// Parse a producer's output.
///
/// Accepts either a full payload (`{doc_id: record}`), in which case every
/// contained record contributes, or a bare record (`{entities, triples}`).
/// Individual entities or triples that don't have the expected shape are
/// skipped rather than failing the whole output.
pub fn parse_output(raw: &RawOutput) -> ParseResult<Contribution> {
    let parsed;
    let value = match raw {
        RawOutput::Json(value) => value,
        RawOutput::Text(text) => {
            parsed = serde_json::from_str::<Value>(strip_code_fence(text))?;
            &parsed
        }
    };

    let Value::Object(object) = value else {
        return Err(ParseError::NotAnObject(json_kind(value)));
    };

    let mut contribution = Contribution::new();
    if is_record(object) {
        collect_record(object, &mut contribution);
    } else {
        for record in object.values().filter_map(Value::as_object) {
            collect_record(record, &mut contribution);
        }
    }

    Ok(contribution)
}

/// Like [`parse_output`], but a failure degrades to an empty contribution.
#[must_use]
pub fn parse_output_lossy(producer: &str, raw: &RawOutput) -> Contribution {
    match parse_output(raw) {
        Ok(contribution) => contribution,
        Err(e) => {
            tracing::warn!("Ignoring output from {}: {}", producer, e);
            Contribution::new()
        }
    }
}

fn is_record(object: &Map<String, Value>) -> bool {
    object.contains_key("entities") || object.contains_key("triples")
}

fn collect_record(record: &Map<String, Value>, into: &mut Contribution) {
    if let Some(Value::Array(entities)) = record.get("entities") {
        into.entities.extend(
            entities
                .iter()
                .filter_map(|e| serde_json::from_value::<Entity>(e.clone()).ok()),
        );
    }
    if let Some(Value::Array(triples)) = record.get("triples") {
        into.triples.extend(
            triples
                .iter()
                .filter_map(|t| serde_json::from_value::<Triple>(t.clone()).ok()),
        );
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
