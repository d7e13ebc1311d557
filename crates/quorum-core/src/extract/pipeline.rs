use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::extractor::{Extractor, RawOutput};
use super::parser::parse_output_lossy;
use crate::config::EnsembleConfig;
use crate::consensus::{refine_triples, Ensembler};
use crate::error::{Error, Result};
use crate::record::{DocumentRecord, DocumentSample, Payload};

/// Runs every registered producer on a document, votes on the results, and
/// optionally refines triples against the confirmed entities.
pub struct ExtractionPipeline {
    extractors: Vec<Arc<dyn Extractor>>,
    refiner: Option<Arc<dyn Extractor>>,
    config: EnsembleConfig,
    ensembler: Ensembler,
}

impl ExtractionPipeline {
    pub fn new(config: EnsembleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractors: Vec::new(),
            refiner: None,
            ensembler: Ensembler::from_config(&config),
            config,
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Result<Self> {
        self.add_extractor(extractor)?;
        Ok(self)
    }

    /// Register a stage-1 producer. Names must be unique; they identify voters.
    pub fn add_extractor(&mut self, extractor: Arc<dyn Extractor>) -> Result<()> {
        if self.extractors.iter().any(|e| e.name() == extractor.name()) {
            return Err(Error::InvalidConfig(format!(
                "duplicate extractor name '{}'",
                extractor.name()
            )));
        }
        self.extractors.push(extractor);
        Ok(())
    }

    /// Use a producer that does not vote in stage 1 for stage-2 triples.
    #[must_use]
    pub fn with_refiner(mut self, refiner: Arc<dyn Extractor>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    fn refinement_producer(&self) -> Result<&Arc<dyn Extractor>> {
        if let Some(refiner) = &self.refiner {
            return Ok(refiner);
        }
        match &self.config.refinement_extractor {
            Some(name) => self
                .extractors
                .iter()
                .find(|e| e.name() == name)
                .ok_or_else(|| {
                    Error::InvalidConfig(format!("refinement extractor '{name}' is not registered"))
                }),
            None => self
                .extractors
                .first()
                .ok_or_else(|| Error::InvalidConfig("no extractor to refine triples with".into())),
        }
    }

    /// Check that stage 2 has a producer to run. Call once every producer
    /// is registered; a single-stage pipeline always passes.
    pub fn ensure_refiner(&self) -> Result<()> {
        if self.config.two_stage {
            self.refinement_producer()?;
        }
        Ok(())
    }

    /// Fan stage 1 out to every producer and wait for all of them. Failed
    /// producers are left out and so contribute nothing.
    async fn collect_outputs(&self, sample: &DocumentSample) -> BTreeMap<String, RawOutput> {
        let mut tasks = JoinSet::new();
        for extractor in &self.extractors {
            let extractor = Arc::clone(extractor);
            let sample = sample.clone();
            tasks.spawn(async move {
                let output = extractor.extract(&sample).await;
                (extractor.name().to_string(), output)
            });
        }

        let mut outputs = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(output))) => {
                    outputs.insert(name, output);
                }
                Ok((name, Err(e))) => {
                    tracing::warn!("{} failed on {}: {}", name, sample.id, e);
                }
                Err(e) => {
                    tracing::warn!("Extractor task for {} aborted: {}", sample.id, e);
                }
            }
        }
        outputs
    }

    pub async fn process_document(&self, sample: &DocumentSample) -> DocumentRecord {
        let outputs = self.collect_outputs(sample).await;
        tracing::debug!(
            "{}: {} of {} producers answered",
            sample.id,
            outputs.len(),
            self.extractors.len()
        );

        let mut record = self.ensembler.combine(&sample.title, &outputs);
        if !self.config.two_stage {
            return record;
        }

        let refiner = match self.refinement_producer() {
            Ok(refiner) => refiner,
            Err(e) => {
                tracing::warn!("Stage 2 skipped on {}: {}; dropping triples", sample.id, e);
                record.triples.clear();
                return record;
            }
        };

        let mentions: Vec<String> = record.mentions().map(str::to_string).collect();
        let candidates = match refiner.extract_triples(sample, &mentions).await {
            Ok(raw) => parse_output_lossy(refiner.name(), &raw).triples,
            Err(e) => {
                tracing::warn!("Stage-2 {} failed on {}: {}", refiner.name(), sample.id, e);
                Vec::new()
            }
        };

        record.triples = refine_triples(candidates, &record.entities);
        record.sort_canonical();
        record
    }

    /// Process documents in parallel, bounded by `max_concurrent_documents`.
    pub async fn process_batch(self: Arc<Self>, samples: Vec<DocumentSample>) -> Payload {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_documents));
        let mut tasks = JoinSet::new();

        for sample in samples {
            let pipeline = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let record = pipeline.process_document(&sample).await;
                (sample.id, record)
            });
        }

        let mut payload = Payload::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((doc_id, record)) => {
                    if payload.insert(doc_id.clone(), record).is_some() {
                        tracing::warn!("Duplicate document id {} in batch; keeping the last", doc_id);
                    }
                }
                Err(e) => tracing::warn!("Document task aborted: {}", e),
            }
        }
        payload
    }
}
