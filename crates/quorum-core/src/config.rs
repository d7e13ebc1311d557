use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ensembling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Producers that must agree on an entity for it to be kept
    pub entity_min_votes: usize,
    /// Producers that must agree on a head/tail pair for a triple to be kept
    pub triple_min_votes: usize,
    /// Run the second, entity-conditioned triple extraction pass
    pub two_stage: bool,
    /// Producer asked for stage-2 triples; the first registered one when unset
    pub refinement_extractor: Option<String>,
    /// Documents processed concurrently in a batch
    pub max_concurrent_documents: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            entity_min_votes: 2,
            triple_min_votes: 2,
            two_stage: true,
            refinement_extractor: None,
            max_concurrent_documents: 4,
        }
    }
}

impl EnsembleConfig {
    /// Load from a JSON file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `QUORUM_*` environment variables.
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = var("QUORUM_ENTITY_MIN_VOTES") {
            self.entity_min_votes = parse_count("QUORUM_ENTITY_MIN_VOTES", &v)?;
        }
        if let Some(v) = var("QUORUM_TRIPLE_MIN_VOTES") {
            self.triple_min_votes = parse_count("QUORUM_TRIPLE_MIN_VOTES", &v)?;
        }
        if let Some(v) = var("QUORUM_TWO_STAGE") {
            self.two_stage = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Some(v) = var("QUORUM_MAX_CONCURRENT_DOCUMENTS") {
            self.max_concurrent_documents = parse_count("QUORUM_MAX_CONCURRENT_DOCUMENTS", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity_min_votes == 0 {
            return Err(Error::InvalidConfig("entity_min_votes must be at least 1".into()));
        }
        if self.triple_min_votes == 0 {
            return Err(Error::InvalidConfig("triple_min_votes must be at least 1".into()));
        }
        if self.max_concurrent_documents == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_documents must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key} must be a non-negative integer, got '{value}'")))
}
