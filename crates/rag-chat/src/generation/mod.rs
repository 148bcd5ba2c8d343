//! Answer generation over retrieved context

pub mod answer;
pub mod prompt;

pub use answer::AnswerGenerator;
pub use prompt::PromptBuilder;
