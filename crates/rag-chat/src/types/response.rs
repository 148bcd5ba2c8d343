//! Response types for the HTTP API

use serde::{Deserialize, Serialize};

use super::document::{Answer, Chunk, Metadata};

/// Response for `POST /ingest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always "ok" on success
    pub status: String,
    /// Number of chunks written to the index
    pub chunks_indexed: usize,
}

impl IngestResponse {
    /// Successful ingest of `chunks_indexed` chunks
    pub fn ok(chunks_indexed: usize) -> Self {
        Self {
            status: "ok".to_string(),
            chunks_indexed,
        }
    }
}

/// A cited source chunk as returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Chunk text, truncated for display
    pub page_content: String,
    /// Chunk metadata
    pub metadata: Metadata,
}

impl SourceDocument {
    /// Build from a chunk, keeping at most `max_chars` characters of text
    pub fn from_chunk(chunk: Chunk, max_chars: usize) -> Self {
        Self {
            page_content: truncate_chars(&chunk.content, max_chars),
            metadata: chunk.metadata,
        }
    }
}

/// Response for `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated answer
    pub answer: String,
    /// Retrieved source chunks, nearest first
    pub sources: Vec<SourceDocument>,
}

impl ChatResponse {
    /// Convert a generated answer, truncating each source
    pub fn from_answer(answer: Answer, max_source_chars: usize) -> Self {
        Self {
            answer: answer.answer,
            sources: answer
                .sources
                .into_iter()
                .map(|chunk| SourceDocument::from_chunk(chunk, max_source_chars))
                .collect(),
        }
    }
}

/// Response for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Keep the first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
