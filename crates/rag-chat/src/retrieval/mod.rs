//! Retrieval-augmented question answering

mod qa;

pub use qa::RetrievalQa;
