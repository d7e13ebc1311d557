mod extractor;
mod parser;
mod pipeline;

pub use extractor::{ExtractionError, ExtractionResult, Extractor, RawOutput, StaticExtractor};
pub use parser::{parse_output, parse_output_lossy, Contribution, ParseError, ParseResult};
pub use pipeline::ExtractionPipeline;
