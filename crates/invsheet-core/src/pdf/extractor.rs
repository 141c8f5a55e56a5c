//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use std::path::Path;
use tracing::{debug, trace};

use super::{PdfPage, PdfProcessor, Result, page_runs};
use crate::error::PdfError;

/// PDF content extractor using lopdf, with pdf-extract as a text fallback.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Extract up to `max_pages` pages (all pages when `None`).
    ///
    /// Page text comes from lopdf one page at a time. When lopdf finds no
    /// text on any page, pdf-extract's per-page text is used instead. Tables
    /// come from pdf-extract's glyph positions.
    pub fn pages(&self, max_pages: Option<usize>) -> Result<Vec<PdfPage>> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        let limit = max_pages.map_or(page_count, |m| (m as u32).min(page_count));

        let mut texts = Vec::with_capacity(limit as usize);
        for number in 1..=limit {
            let text = self.extract_page_text(number).unwrap_or_else(|e| {
                trace!("lopdf could not read page {}: {}", number, e);
                String::new()
            });
            texts.push(text);
        }

        if texts.iter().all(|t| t.trim().is_empty()) {
            debug!("No text from lopdf, falling back to pdf-extract");
            texts = fallback_texts(&self.raw_data, limit as usize)?;
        }

        let layouts = page_runs(&self.raw_data, limit).unwrap_or_else(|e| {
            debug!("No positioned text: {}", e);
            Vec::new()
        });

        let pages: Vec<PdfPage> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let runs = layouts.get(i).map(Vec::as_slice).unwrap_or_default();
                PdfPage::with_runs(i as u32 + 1, text, runs)
            })
            .collect();

        debug!(
            "Extracted {} of {} pages ({} tables)",
            pages.len(),
            page_count,
            pages.iter().map(|p| p.tables.len()).sum::<usize>()
        );
        Ok(pages)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.document()?
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// Text of the first `limit` pages according to pdf-extract.
fn fallback_texts(data: &[u8], limit: usize) -> Result<Vec<String>> {
    let mut texts = pdf_extract::extract_text_from_mem_by_pages(data)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
    texts.truncate(limit);
    Ok(texts)
}

/// Read a PDF file and extract up to `max_pages` pages.
///
/// The file's bytes are released before returning.
pub fn read_pages(path: &Path, max_pages: Option<usize>) -> Result<Vec<PdfPage>> {
    let data = std::fs::read(path).map_err(|source| PdfError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data)?;
    extractor.pages(max_pages)
}
