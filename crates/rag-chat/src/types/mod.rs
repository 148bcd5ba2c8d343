//! Core types for the RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Answer, Chunk, FileType, IndexEntry, Metadata, Segment};
pub use query::ChatRequest;
pub use response::{ChatResponse, HealthResponse, IngestResponse, SourceDocument};
