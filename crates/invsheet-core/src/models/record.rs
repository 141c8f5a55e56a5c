//! Per-file records handed from extraction to the spreadsheet appender.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Placeholder for a field that was not found.
pub const NOT_FOUND: &str = "N/A";

/// Placeholder for a document that could not be opened or parsed.
pub const ERROR: &str = "Error";

/// Extracted field name to value, in first-seen order.
pub type FieldMap = IndexMap<String, String>;

/// One processed PDF, ready to become a spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfRecord {
    filename: String,
    values: Vec<String>,
    source_path: PathBuf,
}

impl PdfRecord {
    /// Create a record. `values` are aligned by position to the active schema.
    pub fn new(filename: impl Into<String>, values: Vec<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            values,
            source_path: source_path.into(),
        }
    }

    /// Create a record whose filename is taken from the path.
    pub fn from_path(path: &Path, values: Vec<String>) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(filename, values, path)
    }

    /// The dedup key.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_path_uses_file_name() {
        let record = PdfRecord::from_path(Path::new("/data/in/a.pdf"), vec!["1.00".into()]);
        assert_eq!(record.filename(), "a.pdf");
        assert_eq!(record.source_path(), Path::new("/data/in/a.pdf"));
    }
}
