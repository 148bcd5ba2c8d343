//! Ingest pipeline: load, chunk, embed and index uploaded files

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{IndexEntry, Segment};

use super::{DocumentLoader, TextChunker};

/// A file written to disk, paired with the name the client uploaded it as
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Location on disk
    pub path: PathBuf,
    /// Client-facing filename, recorded as the chunk source
    pub source: String,
}

/// Runs uploaded files through every ingest stage in order
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl IngestPipeline {
    /// Create a new pipeline
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    /// Ingest `files`, returning the number of chunks indexed
    ///
    /// Every file is loaded before anything is embedded, so a single bad
    /// file fails the request without touching the provider or the index.
    pub async fn ingest(&self, files: Vec<StagedFile>) -> Result<usize> {
        let file_count = files.len();
        let segments = load_all(files).await?;

        let chunks = self.chunker.split_segments(&segments);
        if chunks.is_empty() {
            tracing::info!("Ingested {} files with no text to index", file_count);
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::provider(
                self.embedder.name(),
                format!("expected {} embeddings, received {}", chunks.len(), embeddings.len()),
            ));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect();

        let indexed = self.store.upsert(entries).await?;
        tracing::info!("Indexed {} chunks from {} files", indexed, file_count);
        Ok(indexed)
    }
}

/// Load every file on the blocking pool, keeping upload order
async fn load_all(files: Vec<StagedFile>) -> Result<Vec<Segment>> {
    tokio::task::spawn_blocking(move || {
        let mut segments = Vec::new();
        for file in &files {
            let loaded = DocumentLoader::load(&file.path, &file.source)?;
            tracing::debug!("Loaded {} segments from '{}'", loaded.len(), file.source);
            segments.extend(loaded);
        }
        Ok(segments)
    })
    .await
    .map_err(|e| Error::load("upload", format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalVectorStore;
    use crate::testing::{build_pdf, FailingEmbedder, HashingEmbedder, PdfFont};
    use tempfile::TempDir;

    struct Fixture {
        uploads: TempDir,
        _index: TempDir,
        embedder: Arc<HashingEmbedder>,
        store: Arc<LocalVectorStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let index = tempfile::tempdir().unwrap();
            Self {
                uploads: tempfile::tempdir().unwrap(),
                store: Arc::new(LocalVectorStore::open(index.path()).unwrap()),
                _index: index,
                embedder: Arc::new(HashingEmbedder::new()),
            }
        }

        fn pipeline(&self, chunker: TextChunker) -> IngestPipeline {
            IngestPipeline::new(chunker, self.embedder.clone(), self.store.clone())
        }

        fn stage(&self, name: &str, data: &[u8]) -> StagedFile {
            let path = self.uploads.path().join(name);
            std::fs::write(&path, data).unwrap();
            StagedFile {
                path,
                source: name.to_string(),
            }
        }
    }

    #[tokio::test]
    async fn test_ingest_counts_chunks() {
        let fixture = Fixture::new();
        let chunker = TextChunker::new(900, 100).unwrap();
        let text = "lorem ipsum ".repeat(200);

        let expected = chunker
            .split_segment(&Segment::new(text.as_str(), "long.txt", 0))
            .len()
            + 1;
        let files = vec![
            fixture.stage("long.txt", text.as_bytes()),
            fixture.stage("short.txt", b"The sky is blue. The grass is green."),
        ];

        let indexed = fixture.pipeline(chunker).ingest(files).await.unwrap();
        assert_eq!(indexed, expected);
        assert_eq!(fixture.store.len().await.unwrap(), expected);
        assert_eq!(fixture.embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_skips_embedding() {
        let fixture = Fixture::new();
        let files = vec![
            fixture.stage("good.txt", b"fine"),
            fixture.stage("bad.pdf", b"not a pdf at all"),
        ];

        let err = fixture
            .pipeline(TextChunker::new(900, 100).unwrap())
            .ingest(files)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Load { ref filename, .. } if filename == "bad.pdf"));
        assert_eq!(fixture.embedder.calls(), 0);
        assert!(fixture.store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_file_indexes_nothing() {
        let fixture = Fixture::new();
        let files = vec![fixture.stage("empty.txt", b"")];

        let indexed = fixture
            .pipeline(TextChunker::new(900, 100).unwrap())
            .ingest(files)
            .await
            .unwrap();

        assert_eq!(indexed, 0);
        assert_eq!(fixture.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_index_untouched() {
        let fixture = Fixture::new();
        let pipeline = IngestPipeline::new(
            TextChunker::new(900, 100).unwrap(),
            Arc::new(FailingEmbedder),
            fixture.store.clone(),
        );

        let err = pipeline
            .ingest(vec![fixture.stage("a.txt", b"some text")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(fixture.store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_repeated_ingest_duplicates_entries() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline(TextChunker::new(900, 100).unwrap());

        pipeline.ingest(vec![fixture.stage("a.txt", b"same text")]).await.unwrap();
        pipeline.ingest(vec![fixture.stage("a.txt", b"same text")]).await.unwrap();
        assert_eq!(fixture.store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_pdf_without_fonts_reports_load_error_or_text() {
        let fixture = Fixture::new();
        let pdf = build_pdf("Hello from a bare page", PdfFont::MissingResource);

        let result = fixture
            .pipeline(TextChunker::new(900, 100).unwrap())
            .ingest(vec![fixture.stage("bare.pdf", &pdf)])
            .await;

        match result {
            Ok(indexed) => assert_eq!(indexed, fixture.store.len().await.unwrap()),
            Err(Error::Load { filename, .. }) => assert_eq!(filename, "bare.pdf"),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
