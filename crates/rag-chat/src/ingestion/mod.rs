//! Document ingestion: loading, chunking and indexing uploads

mod chunker;
mod loader;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::DocumentLoader;
pub use pipeline::{IngestPipeline, StagedFile};
