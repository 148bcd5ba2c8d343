//! Prompt templates for RAG generation

use crate::types::Chunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate every chunk, in retrieval order, into one context block
    pub fn build_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// System message: answering instructions followed by the context
    pub fn system_prompt(context: &str) -> String {
        format!(
            r#"Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{context}"#,
            context = context
        )
    }
}
