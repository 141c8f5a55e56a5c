//! Invoice field extraction.
//!
//! [`FieldExtractor`] runs the rule passes from [`rules`] over each page and
//! collects label/value pairs in first-seen order. The file-level helpers
//! open the PDF first and turn failures into empty results or sentinels so a
//! single bad document never stops a batch.

pub mod rules;

use std::path::Path;

use tracing::{debug, warn};

use crate::models::{ERROR, FieldMap, NOT_FOUND};
use crate::pdf::{PdfPage, read_pages};
use rules::{FieldRule, default_rules, extract_default_amount};

/// Canonical name that falls back to the dedicated total-amount search.
const TOTAL_AMOUNT: &str = "Total Amount";

/// General-purpose field extractor.
pub struct FieldExtractor {
    /// Maximum pages scanned.
    max_pages: usize,
    rules: Vec<&'static dyn FieldRule>,
}

impl FieldExtractor {
    /// Create an extractor with the default rules and a three-page limit.
    pub fn new() -> Self {
        Self {
            max_pages: 3,
            rules: default_rules().to_vec(),
        }
    }

    /// Set the page limit.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Every field found on the first `max_pages` pages.
    pub fn extract_fields(&self, pages: &[PdfPage]) -> FieldMap {
        let mut fields = FieldMap::new();
        for page in pages.iter().take(self.max_pages) {
            for rule in &self.rules {
                let before = fields.len();
                rule.apply(page, &mut fields);
                debug!(
                    "Page {}: {} rule added {} field(s)",
                    page.number,
                    rule.name(),
                    fields.len() - before
                );
            }
        }
        fields
    }

    /// Only the requested fields, keyed by the requested names.
    ///
    /// Names match exactly first, then ignoring case and a trailing `:` or
    /// `#`. A missing "Total Amount" falls back to the total-amount search.
    pub fn extract_named_fields<S: AsRef<str>>(&self, pages: &[PdfPage], names: &[S]) -> FieldMap {
        let all = self.extract_fields(pages);
        let mut found = FieldMap::new();

        for name in names {
            let name = name.as_ref();
            let value = lookup(&all, name).map(str::to_string).or_else(|| {
                normalize_key(name)
                    .eq(&normalize_key(TOTAL_AMOUNT))
                    .then(|| extract_default_amount(&pages[..pages.len().min(self.max_pages)]))
                    .flatten()
            });
            if let Some(value) = value {
                found.insert(name.to_string(), value);
            }
        }
        found
    }

    /// Fields from a PDF file, or an empty map if it cannot be read.
    pub fn fields_from_file(&self, path: &Path) -> FieldMap {
        match read_pages(path, Some(self.max_pages)) {
            Ok(pages) => self.extract_fields(&pages),
            Err(e) => {
                warn!("Error reading {}: {}", display_name(path), e);
                FieldMap::new()
            }
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Total amount of a PDF file: the amount, "N/A", or "Error".
///
/// Every page is searched.
pub fn default_amount_from_file(path: &Path) -> String {
    match read_pages(path, None) {
        Ok(pages) => extract_default_amount(&pages).unwrap_or_else(|| NOT_FOUND.to_string()),
        Err(e) => {
            warn!("Error reading {}: {}", display_name(path), e);
            ERROR.to_string()
        }
    }
}

/// Field names present in every map, in the order of the first map.
pub fn common_fields(maps: &[FieldMap]) -> Vec<String> {
    let Some((first, rest)) = maps.split_first() else {
        return Vec::new();
    };
    first
        .keys()
        .filter(|key| rest.iter().all(|m| m.contains_key(*key)))
        .cloned()
        .collect()
}

fn lookup<'a>(fields: &'a FieldMap, name: &str) -> Option<&'a str> {
    if let Some(value) = fields.get(name) {
        return Some(value);
    }
    let wanted = normalize_key(name);
    fields
        .iter()
        .find(|(key, _)| normalize_key(key) == wanted)
        .map(|(_, value)| value.as_str())
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .trim_end_matches([':', '#'])
        .trim_end()
        .to_lowercase()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
