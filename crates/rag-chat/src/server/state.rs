//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::providers::{
    EmbeddingProvider, LlmProvider, LocalVectorStore, OpenAiChat, OpenAiEmbedder,
    VectorStoreProvider,
};
use crate::retrieval::RetrievalQa;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Chunker built from the chunking configuration
    chunker: TextChunker,
    /// Embedding provider
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm_provider: Arc<dyn LlmProvider>,
    /// Vector index
    vector_store_provider: Arc<dyn VectorStoreProvider>,
}

impl AppState {
    /// Create application state with OpenAI providers and the local index
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let embedder = Arc::new(OpenAiEmbedder::new(&config.openai, &config.embedding)?);
        let llm = Arc::new(OpenAiChat::new(&config.openai, &config.llm)?);
        tracing::info!(
            "OpenAI providers initialized (embedding: {}, chat: {})",
            config.embedding.model,
            config.llm.model
        );
        if config.openai.api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set; ingest and chat requests will fail");
        }

        let store = Arc::new(LocalVectorStore::from_config(&config)?);

        Self::from_parts(config, embedder, llm, store)
    }

    /// Create application state from explicit providers
    pub fn from_parts(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        vector_store_provider: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::from_config(&config.chunking)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                chunker,
                embedding_provider,
                llm_provider,
                vector_store_provider,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Ingest pipeline over the shared providers
    pub fn ingest_pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(
            self.inner.chunker.clone(),
            Arc::clone(&self.inner.embedding_provider),
            Arc::clone(&self.inner.vector_store_provider),
        )
    }

    /// Fresh question-answering pipeline for one chat request
    pub fn retrieval_qa(&self) -> RetrievalQa {
        RetrievalQa::new(
            Arc::clone(&self.inner.embedding_provider),
            Arc::clone(&self.inner.vector_store_provider),
            AnswerGenerator::new(Arc::clone(&self.inner.llm_provider)),
            self.inner.config.retrieval.top_k,
        )
    }
}
