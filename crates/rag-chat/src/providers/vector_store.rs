//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, IndexEntry};

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine distance to the query (0.0 is identical, lower is nearer)
    pub distance: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: on-disk SQLite index under `CHROMA_DIR`
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Append entries; returns how many were written
    ///
    /// Entries are never deduplicated. The write is durable once this returns.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Return up to `top_k` entries nearest to `query_embedding`, nearest first
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of entries stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
