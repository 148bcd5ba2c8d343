//! Deterministic in-process providers for tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};

const DIMENSIONS: usize = 64;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "does", "how", "is", "of", "the", "to", "was", "what", "which", "who",
];

fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Bag-of-words embedder hashing keywords into a fixed number of buckets
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in keywords(text) {
            vector[(fnv1a(&word) % DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Embedder that always fails
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::provider("test", "embedding service unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Answers with the context sentence sharing the most keywords with the question
pub struct ExtractiveLlm;

#[async_trait]
impl LlmProvider for ExtractiveLlm {
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        let wanted = keywords(question);
        let best = context
            .split_inclusive(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (keywords(s).intersection(&wanted).count(), s))
            .filter(|(score, _)| *score > 0)
            .fold(None::<(usize, &str)>, |best, candidate| match best {
                Some(b) if b.0 >= candidate.0 => Some(b),
                _ => Some(candidate),
            });

        Ok(best
            .map(|(_, sentence)| sentence.to_string())
            .unwrap_or_else(|| "I don't know.".to_string()))
    }

    fn name(&self) -> &str {
        "extractive"
    }

    fn model(&self) -> &str {
        "extractive-test"
    }
}

/// Chat model that always fails
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn generate_answer(&self, _question: &str, _context: &str) -> Result<String> {
        Err(Error::provider("test", "generation service unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-test"
    }
}

/// Font setup of a generated test PDF
#[derive(Debug, Clone, Copy)]
pub enum PdfFont {
    /// `F1` resource bound to Helvetica
    Helvetica,
    /// No `/Font` resource at all
    MissingResource,
    /// Helvetica bound to `F1`, but the text uses `F9`
    Undefined,
}

/// One-page PDF showing `text`
pub fn build_pdf(text: &str, font: PdfFont) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let resources = match font {
        PdfFont::MissingResource => Dictionary::new(),
        PdfFont::Helvetica | PdfFont::Undefined => {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            });
            dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            }
        }
    };
    let resources_id = doc.add_object(resources);

    let font_name = match font {
        PdfFont::Undefined => "F9",
        _ => "F1",
    };
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font_name.into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
