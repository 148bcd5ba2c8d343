//! Question answering pipeline: embed, retrieve, generate

use std::sync::Arc;

use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::Answer;

/// Embedder, vector store and answer generator composed for one question
pub struct RetrievalQa {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    generator: AnswerGenerator,
    top_k: usize,
}

impl RetrievalQa {
    /// Compose a pipeline retrieving `top_k` chunks per question
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        generator: AnswerGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            top_k,
        }
    }

    /// Answer `question` from the nearest indexed chunks
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let query_embedding = self.embedder.embed(question).await?;

        let results = self.store.search(&query_embedding, self.top_k).await?;
        tracing::debug!(
            "Retrieved {} chunks from {} (top_k={})",
            results.len(),
            self.store.name(),
            self.top_k
        );

        let chunks = results.into_iter().map(|r| r.chunk).collect();
        self.generator.generate(question, chunks).await
    }
}
