//! Storage module for persistent data storage
//!
//! Provides the SQLite-backed vector index that lives under `CHROMA_DIR`.

mod vector_index;

pub use vector_index::{VectorIndex, INDEX_FILENAME};
