//! Journal ingestion
//!
//! A journal document is turned into text by a [`DocumentExtractor`],
//! anonymized, and attached to the session as its journal excerpt.
//! Extraction never fails: unreadable documents yield empty text.

mod anonymize;
mod word_cloud;

use serde::Serialize;

use crate::{Error, Result};

pub use anonymize::{Redaction, anonymize};
pub use word_cloud::{WordWeight, is_stop_word, meaningful_words, word_frequencies};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Pulls plain text out of an uploaded document
pub trait DocumentExtractor: Send + Sync {
    /// Extract text; failures degrade to an empty string with a warning
    fn extract_text(&self, document: &[u8]) -> String;
}

/// PDF text extraction backed by `pdf-extract`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract text, reporting why a document could not be read
    ///
    /// # Errors
    ///
    /// Returns `Error::Document` for unreadable or malformed PDFs
    pub fn read(document: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(document)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::Document(e.to_string())),
            Err(_) => Err(Error::Document("PDF parser aborted on malformed input".to_string())),
        }
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract_text(&self, document: &[u8]) -> String {
        match Self::read(document) {
            Ok(text) => {
                tracing::debug!(chars = text.len(), "extracted PDF text");
                text
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read PDF, using empty text");
                String::new()
            }
        }
    }
}

/// Plain-text documents, decoded as lossy UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract_text(&self, document: &[u8]) -> String {
        String::from_utf8_lossy(document).into_owned()
    }
}

/// Dispatches on the `%PDF` magic bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoExtractor;

impl DocumentExtractor for AutoExtractor {
    fn extract_text(&self, document: &[u8]) -> String {
        if document.starts_with(PDF_MAGIC) {
            PdfExtractor.extract_text(document)
        } else {
            PlainTextExtractor.extract_text(document)
        }
    }
}

/// An ingested, anonymized journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalDocument {
    pub filename: Option<String>,
    /// Anonymized text
    pub text: String,
    /// Kinds of personal details that were removed
    pub redactions: Vec<Redaction>,
}

impl JournalDocument {
    /// Extract and anonymize a document
    #[must_use]
    pub fn ingest(
        extractor: &dyn DocumentExtractor,
        document: &[u8],
        filename: Option<String>,
    ) -> Self {
        let raw = extractor.extract_text(document);
        let (text, redactions) = anonymize(&raw);

        tracing::info!(
            filename = filename.as_deref().unwrap_or("<unnamed>"),
            bytes = document.len(),
            chars = text.chars().count(),
            redactions = redactions.len(),
            "journal ingested"
        );

        Self {
            filename,
            text,
            redactions,
        }
    }

    /// True when extraction produced no usable text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Word-cloud terms for this journal
    #[must_use]
    pub fn word_cloud(&self, limit: usize) -> Vec<WordWeight> {
        word_frequencies(&self.text, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_anonymized_on_ingest() {
        let doc = JournalDocument::ingest(
            &AutoExtractor,
            b"Felt anxious. Texted sam@example.com about it.",
            Some("notes.txt".to_string()),
        );
        assert_eq!(doc.text, "Felt anxious. Texted [EMAIL REDACTED] about it.");
        assert_eq!(doc.redactions, vec![Redaction::EmailAddresses]);
        assert!(!doc.is_empty());
    }

    #[test]
    fn broken_pdf_degrades_to_empty_text() {
        let doc = JournalDocument::ingest(&AutoExtractor, b"%PDF-1.7 truncated garbage", None);
        assert!(doc.is_empty());
        assert!(doc.redactions.is_empty());
        assert!(matches!(
            PdfExtractor::read(b"%PDF-1.7 truncated garbage"),
            Err(Error::Document(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let text = PlainTextExtractor.extract_text(&[b'h', b'i', 0xff]);
        assert!(text.starts_with("hi"));
    }
}
