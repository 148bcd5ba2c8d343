//! Fixed-size character window chunking with overlap

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::document::{CHUNK_INDEX_KEY, START_INDEX_KEY};
use crate::types::{Chunk, Segment};

/// Text chunker with configurable size and overlap
///
/// Each segment is cut into windows of `chunk_size` characters, advancing
/// by `chunk_size - overlap`; only the final window of a segment may be
/// shorter. Sizes count Unicode scalar values, not bytes.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::configuration("chunk size must be greater than zero"));
        }
        if overlap >= chunk_size {
            return Err(Error::configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk every segment, flattening the result in order
    pub fn split_segments(&self, segments: &[Segment]) -> Vec<Chunk> {
        segments
            .iter()
            .flat_map(|segment| self.split_segment(segment))
            .collect()
    }

    /// Chunk one segment, copying its metadata into every chunk
    pub fn split_segment(&self, segment: &Segment) -> Vec<Chunk> {
        self.windows(&segment.content)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start, text))| {
                let mut metadata = segment.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), chunk_index.into());
                metadata.insert(START_INDEX_KEY.to_string(), start.into());
                Chunk {
                    content: text.to_string(),
                    metadata,
                }
            })
            .collect()
    }

    /// Character windows of `text` as (char offset, slice) pairs
    fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the string
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut windows = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            windows.push((start, &text[boundaries[start]..boundaries[end]]));
            if end == char_count {
                break;
            }
            start += step;
        }

        windows
    }
}
