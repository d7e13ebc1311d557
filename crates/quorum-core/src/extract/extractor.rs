use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::record::{DocumentSample, Payload};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Failed(String),
    #[error("Producer unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// What a producer hands back: structured JSON, or text still to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Json(Value),
    Text(String),
}

impl From<Value> for RawOutput {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RawOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A source of candidate entities and triples for a document: a model
/// backend, a rule engine, a human annotator.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, sample: &DocumentSample) -> ExtractionResult<RawOutput>;

    /// Second pass: triples conditioned on already-confirmed entity mentions.
    async fn extract_triples(
        &self,
        sample: &DocumentSample,
        mentions: &[String],
    ) -> ExtractionResult<RawOutput> {
        let _ = mentions;
        self.extract(sample).await
    }
}

/// Serves outputs recorded ahead of time, keyed by document id.
pub struct StaticExtractor {
    name: String,
    outputs: BTreeMap<String, RawOutput>,
    triple_outputs: BTreeMap<String, RawOutput>,
}

impl StaticExtractor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: BTreeMap::new(),
            triple_outputs: BTreeMap::new(),
        }
    }

    /// One output per document of an already-parsed payload, in payload shape.
    pub fn from_payload(name: impl Into<String>, payload: &Payload) -> crate::Result<Self> {
        let mut extractor = Self::new(name);
        for (doc_id, record) in payload {
            let mut single = serde_json::Map::new();
            single.insert(doc_id.clone(), serde_json::to_value(record)?);
            extractor
                .outputs
                .insert(doc_id.clone(), RawOutput::Json(Value::Object(single)));
        }
        Ok(extractor)
    }

    #[must_use]
    pub fn with_output(mut self, doc_id: impl Into<String>, output: impl Into<RawOutput>) -> Self {
        self.outputs.insert(doc_id.into(), output.into());
        self
    }

    #[must_use]
    pub fn with_triple_output(
        mut self,
        doc_id: impl Into<String>,
        output: impl Into<RawOutput>,
    ) -> Self {
        self.triple_outputs.insert(doc_id.into(), output.into());
        self
    }

    pub fn document_ids(&self) -> impl Iterator<Item = &String> {
        self.outputs.keys()
    }
}

#[async_trait::async_trait]
impl Extractor for StaticExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, sample: &DocumentSample) -> ExtractionResult<RawOutput> {
        self.outputs.get(&sample.id).cloned().ok_or_else(|| {
            ExtractionError::Failed(format!("no recorded output for document {}", sample.id))
        })
    }

    async fn extract_triples(
        &self,
        sample: &DocumentSample,
        _mentions: &[String],
    ) -> ExtractionResult<RawOutput> {
        match self.triple_outputs.get(&sample.id) {
            Some(output) => Ok(output.clone()),
            None => self.extract(sample).await,
        }
    }
}
