//! Data models shared by the extractor, appender and CLI.

pub mod config;
pub mod record;

pub use config::{ExtractionConfig, FieldMapping, InvsheetConfig, OutputConfig};
pub use record::{ERROR, FieldMap, NOT_FOUND, PdfRecord};
