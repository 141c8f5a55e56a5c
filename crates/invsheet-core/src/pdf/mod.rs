//! PDF processing module.

mod extractor;
mod layout;
mod tables;

pub use extractor::{PdfExtractor, read_pages};
pub use layout::{TextRun, page_runs, tables_from_runs};
pub use tables::{Table, detect_tables};

#[cfg(test)]
pub(crate) use extractor::tests::{write_placed_pdf, write_text_pdf};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text and tables from a single PDF page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text, one visual line per text line.
    pub text: String,
    /// Tables found on the page.
    pub tables: Vec<Table>,
}

impl PdfPage {
    /// Build a page from text, detecting tables from its layout.
    pub fn from_text(number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let tables = detect_tables(&text);
        Self { number, text, tables }
    }

    /// Build a page whose tables come from positioned text runs. Falls back
    /// to the text layout when the runs form no table.
    pub fn with_runs(number: u32, text: impl Into<String>, runs: &[TextRun]) -> Self {
        let text = text.into();
        let mut tables = tables_from_runs(runs);
        if tables.is_empty() {
            tables = detect_tables(&text);
        }
        Self { number, text, tables }
    }

    /// Non-empty, trimmed text lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}
