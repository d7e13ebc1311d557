mod analyze;
mod ensemble;
mod merge;
mod refine;

pub use analyze::{analyze_and_combine, AnalysisReport, DedupCounts};
pub use ensemble::Ensembler;
pub use merge::{merge_files, MergeReport, Merger, SkippedSource};
pub use refine::refine_triples;
