//! Local vector store provider backed by the on-disk SQLite index
//!
//! The index is synchronous, so every call runs on the blocking pool.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::storage::VectorIndex;
use crate::types::IndexEntry;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Local vector store wrapping a `VectorIndex`
pub struct LocalVectorStore {
    index: Arc<VectorIndex>,
}

impl LocalVectorStore {
    /// Create from an existing index
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index }
    }

    /// Open the index stored under `persist_directory`
    pub fn open<P: AsRef<Path>>(persist_directory: P) -> Result<Self> {
        let index = VectorIndex::open(persist_directory)?;
        tracing::info!("Opened vector index at {}", index.path().display());
        Ok(Self::new(Arc::new(index)))
    }

    /// Create from config
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::open(&config.vector_db.persist_directory)
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || index.upsert(&entries))
            .await
            .map_err(|e| Error::index(format!("Task join error: {}", e)))?
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let index = self.index.clone();
        let query = query_embedding.to_vec();

        tokio::task::spawn_blocking(move || {
            let results = index.search(&query, top_k)?;
            Ok(results
                .into_iter()
                .map(|(entry, distance)| VectorSearchResult {
                    chunk: entry.into_chunk(),
                    distance,
                })
                .collect())
        })
        .await
        .map_err(|e| Error::index(format!("Task join error: {}", e)))?
    }

    async fn len(&self) -> Result<usize> {
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || index.len())
            .await
            .map_err(|e| Error::index(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}
