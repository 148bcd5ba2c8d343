//! Segment, chunk and index entry types that flow through the pipeline

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form metadata attached to segments, chunks and index entries
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the originating filename
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the segment's position within its document
pub const SEGMENT_INDEX_KEY: &str = "segment_index";
/// Metadata key holding the chunk's position within its segment
pub const CHUNK_INDEX_KEY: &str = "chunk_index";
/// Metadata key holding the chunk's character offset within its segment
pub const START_INDEX_KEY: &str = "start_index";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// UTF-8 plain text (every non-PDF file)
    Text,
}

impl FileType {
    /// Detect file type from a filename or path
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(".pdf") {
            Self::Pdf
        } else {
            Self::Text
        }
    }
}

/// Loader output: a run of text plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Text content
    pub content: String,
    /// Source metadata (filename, position)
    pub metadata: Metadata,
}

impl Segment {
    /// Create a segment for `source` at position `index`
    pub fn new(content: impl Into<String>, source: &str, index: usize) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        metadata.insert(SEGMENT_INDEX_KEY.to_string(), index.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Originating filename
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(|v| v.as_str())
    }
}

/// A bounded slice of a segment, ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub content: String,
    /// Segment metadata plus chunk position
    pub metadata: Metadata,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Originating filename
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(|v| v.as_str())
    }
}

/// A persisted (vector, text, metadata) record in the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Entry ID
    pub id: Uuid,
    /// Chunk text
    pub content: String,
    /// Chunk metadata
    pub metadata: Metadata,
    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Pair a chunk with its embedding
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: chunk.content,
            metadata: chunk.metadata,
            embedding,
        }
    }

    /// Drop the vector, keeping text and metadata
    pub fn into_chunk(self) -> Chunk {
        Chunk {
            content: self.content,
            metadata: self.metadata,
        }
    }
}

/// Generated answer with the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct Answer {
    /// Generated text
    pub answer: String,
    /// Retrieved chunks, nearest first
    pub sources: Vec<Chunk>,
}
