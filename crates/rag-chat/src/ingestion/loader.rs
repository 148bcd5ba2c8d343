//! File loaders for plain text and PDF

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{FileType, Segment};

/// Converts a file on disk into ordered text segments
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load `path`, tagging segments with `source` (the client-facing filename)
    ///
    /// The format is chosen from `source`: `.pdf` files go through the PDF
    /// loader, everything else must be UTF-8 text.
    pub fn load(path: &Path, source: &str) -> Result<Vec<Segment>> {
        let data = std::fs::read(path)
            .map_err(|e| Error::load(source, format!("Failed to read file: {}", e)))?;

        match FileType::from_filename(source) {
            FileType::Pdf => Self::load_pdf(&data, source),
            FileType::Text => Self::load_text(&data, source),
        }
    }

    /// Decode UTF-8 text as a single segment
    pub fn load_text(data: &[u8], source: &str) -> Result<Vec<Segment>> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::load(source, format!("File is not valid UTF-8: {}", e)))?;
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);

        Ok(vec![Segment::new(content, source, 0)])
    }

    /// Extract PDF text as a single segment
    pub fn load_pdf(data: &[u8], source: &str) -> Result<Vec<Segment>> {
        let raw = match extract_pdf_text_guarded(data) {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!("pdf-extract failed for '{}': {}, trying lopdf", source, reason);
                Self::extract_pdf_text_fallback(data, source)?
            }
        };

        let content = cleanup_pdf_text(&raw);
        if content.is_empty() {
            return Err(Error::load(source, "No text content could be extracted from PDF"));
        }

        let mut segment = Segment::new(content, source, 0);
        if let Ok(doc) = lopdf::Document::load_mem(data) {
            segment
                .metadata
                .insert("total_pages".to_string(), doc.get_pages().len().into());
        }

        Ok(vec![segment])
    }

    /// Page-by-page extraction using lopdf directly
    fn extract_pdf_text_fallback(data: &[u8], source: &str) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::load(source, format!("Failed to parse PDF: {}", e)))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    tracing::debug!("Could not extract page {} of '{}': {}", page_number, source, e)
                }
            }
        }

        Ok(text)
    }
}

/// Run pdf-extract, turning a panic inside it into an error
///
/// pdf-extract panics on some well-formed PDFs (pages without a font
/// resource, `Tf` naming an undefined font).
fn extract_pdf_text_guarded(data: &[u8]) -> std::result::Result<String, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(format!("panicked: {}", message))
        }
    }
}

/// Drop NUL bytes, trim every line and remove blank lines
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
