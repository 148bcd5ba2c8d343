//! Provider abstractions for embeddings, generation, and vector storage
//!
//! Each external collaborator sits behind a trait so the pipeline can be
//! exercised against any OpenAI-compatible endpoint or an in-process double.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod openai;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use openai::{OpenAiChat, OpenAiEmbedder};
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
