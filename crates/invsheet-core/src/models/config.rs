//! Configuration structures for the extraction and append pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Main configuration for invsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvsheetConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Which fields become spreadsheet columns.
    pub mapping: FieldMapping,

    /// Spreadsheet output configuration.
    pub output: OutputConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum pages scanned by the general field extractor.
    pub max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_pages: 3 }
    }
}

/// Spreadsheet output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sheet used when neither a sheet name nor "create new" is given.
    pub default_sheet: String,

    /// Display text of the link back to the source PDF.
    pub link_text: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_sheet: "PDF Files".to_string(),
            link_text: "Open Invoice".to_string(),
        }
    }
}

/// Ordered, duplicate-free list of field names.
///
/// The order defines the spreadsheet column order. An empty mapping selects
/// the legacy "Total Amount" schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    fields: Vec<String>,
}

impl FieldMapping {
    /// Build a mapping, rejecting empty and repeated names.
    pub fn new<I, S>(fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = Self::default();
        for field in fields {
            mapping.push(field.as_ref())?;
        }
        Ok(mapping)
    }

    /// Append a field name.
    pub fn push(&mut self, field: &str) -> Result<(), ConfigError> {
        let field = field.trim();
        if field.is_empty() {
            return Err(ConfigError::EmptyField);
        }
        if self.contains(field) {
            return Err(ConfigError::DuplicateField(field.to_string()));
        }
        self.fields.push(field.to_string());
        Ok(())
    }

    /// Remove a field name. Returns whether it was present.
    pub fn remove(&mut self, field: &str) -> bool {
        let field = field.trim();
        let before = self.fields.len();
        self.fields.retain(|f| f != field);
        self.fields.len() != before
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl InvsheetConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        // Hand-edited files may repeat names; the first occurrence wins.
        let mut mapping = FieldMapping::default();
        for field in config.mapping.fields() {
            if let Err(e) = mapping.push(field) {
                tracing::warn!("Ignoring mapped field: {}", e);
            }
        }
        Ok(Self { mapping, ..config })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mapping_rejects_duplicates() {
        let mut mapping = FieldMapping::new(["Invoice Number", "Total"]).unwrap();
        assert!(matches!(
            mapping.push(" Total "),
            Err(ConfigError::DuplicateField(f)) if f == "Total"
        ));
        assert!(matches!(mapping.push("   "), Err(ConfigError::EmptyField)));
        assert_eq!(mapping.fields(), ["Invoice Number", "Total"]);
    }

    #[test]
    fn test_mapping_remove() {
        let mut mapping = FieldMapping::new(["A", "B", "C"]).unwrap();
        assert!(mapping.remove("B"));
        assert!(!mapping.remove("B"));
        assert_eq!(mapping.fields(), ["A", "C"]);
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = InvsheetConfig::default();
        config.mapping = FieldMapping::new(["Invoice Number", "Due Date"]).unwrap();
        config.extraction.max_pages = 5;
        config.save(&path).unwrap();

        let loaded = InvsheetConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"mapping": {"fields": ["Total", "Total", "Vendor"]}}"#).unwrap();

        let config = InvsheetConfig::from_file(&path).unwrap();
        assert_eq!(config.extraction.max_pages, 3);
        assert_eq!(config.output.default_sheet, "PDF Files");
        assert_eq!(config.mapping.fields(), ["Total", "Vendor"]);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = InvsheetConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert!(config.mapping.is_empty());
    }
}
