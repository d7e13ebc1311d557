#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod consensus;
pub mod error;
pub mod extract;
pub mod identity;
pub mod record;
pub mod storage;
pub mod validate;

pub use config::EnsembleConfig;
pub use consensus::{
    analyze_and_combine, merge_files, refine_triples, AnalysisReport, DedupCounts, Ensembler,
    MergeReport, Merger, SkippedSource,
};
pub use error::{Error, Result};
pub use extract::{
    parse_output, Contribution, ExtractionError, ExtractionPipeline, Extractor, RawOutput,
    StaticExtractor,
};
pub use identity::normalize;
pub use record::{
    compare_document_ids, DocumentRecord, DocumentSample, Entity, IdComparison, Payload, Triple,
};
pub use storage::{read_json, read_payload, write_payload};
pub use validate::{validate, SchemaError, ValidationOptions};
