//! rag-chat: minimal retrieval-augmented question answering over uploaded documents
//!
//! Uploaded text and PDF files are split into overlapping character windows,
//! embedded with an OpenAI-compatible API and stored in a persistent local
//! vector index. Questions are answered by retrieving the nearest chunks and
//! passing them, as a single context block, to a chat model.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Answer, Chunk, FileType},
    query::ChatRequest,
    response::{ChatResponse, IngestResponse},
};
