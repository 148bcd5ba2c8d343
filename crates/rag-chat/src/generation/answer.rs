//! "Stuff" answer generation: every retrieved chunk goes into a single prompt

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{Answer, Chunk};

use super::PromptBuilder;

/// Generates an answer grounded on retrieved chunks
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    /// Create a generator over `llm`
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Answer `question` from `chunks`, returning the chunks as sources
    ///
    /// An empty chunk list still calls the model, with empty context.
    pub async fn generate(&self, question: &str, chunks: Vec<Chunk>) -> Result<Answer> {
        let context = PromptBuilder::build_context(&chunks);

        tracing::debug!(
            "Generating answer with {} ({} chunks in context)",
            self.llm.model(),
            chunks.len()
        );

        let answer = self.llm.generate_answer(question, &context).await?;

        Ok(Answer {
            answer,
            sources: chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ExtractiveLlm;
    use crate::types::Segment;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            content: text.to_string(),
            metadata: Segment::new("", "facts.txt", 0).metadata,
        }
    }

    #[tokio::test]
    async fn test_answer_uses_context_and_returns_sources() {
        let generator = AnswerGenerator::new(Arc::new(ExtractiveLlm));
        let chunks = vec![chunk("The grass is green."), chunk("The sky is blue.")];

        let answer = generator.generate("What color is the sky?", chunks.clone()).await.unwrap();
        assert_eq!(answer.answer, "The sky is blue.");
        assert_eq!(answer.sources, chunks);
    }

    #[tokio::test]
    async fn test_no_chunks_still_answers() {
        let generator = AnswerGenerator::new(Arc::new(ExtractiveLlm));
        let answer = generator.generate("What color is the sky?", Vec::new()).await.unwrap();
        assert_eq!(answer.answer, "I don't know.");
        assert!(answer.sources.is_empty());
    }
}
