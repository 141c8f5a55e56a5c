//! Core library for turning folders of PDF invoices into spreadsheet rows.
//!
//! This crate provides:
//! - PDF text and table extraction
//! - Rule-based invoice field extraction and total-amount search
//! - Appending records to an xlsx workbook with duplicate detection
//! - Folder scanning and a batch pipeline with progress reporting

pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod sheet;

pub use error::{ConfigError, InvsheetError, PdfError, Result, ScanError, SheetError};
pub use extract::{FieldExtractor, common_fields, default_amount_from_file};
pub use models::{FieldMap, FieldMapping, InvsheetConfig, PdfRecord};
pub use pdf::{PdfExtractor, PdfPage, PdfProcessor, read_pages};
pub use pipeline::{BatchJob, ProgressEvent, collect_records};
pub use scan::scan_pdf_folder;
pub use sheet::{AppendOutcome, SheetAppender, SheetTarget, append_records, clear_sheet, list_sheets};
