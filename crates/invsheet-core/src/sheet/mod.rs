//! Destination workbook: sheet selection, header schema and row appends.

mod appender;
mod workbook;

pub use appender::{AppendOutcome, SheetAppender, append_records, clear_sheet, list_sheets, sheet_choices};
pub use workbook::{CellValue, Sheet, Workbook};

use crate::models::FieldMapping;

/// Header of column A, also used to recognize an invoice sheet.
pub const FILENAME_HEADER: &str = "PDF Filename";

/// Value column header when no field mapping is configured.
pub const TOTAL_AMOUNT_HEADER: &str = "Total Amount";

/// Header of the last column.
pub const LINK_HEADER: &str = "Path to Invoice";

/// Label offered ahead of the existing sheet names.
pub const NEW_SHEET_LABEL: &str = "[Create New Sheet]";

/// Base name for created sheets.
pub const DEFAULT_SHEET_NAME: &str = "PDF Files";

/// Displayed text of hyperlink cells.
pub const DEFAULT_LINK_TEXT: &str = "Open Invoice";

/// Which sheet receives the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetTarget {
    /// An existing sheet, or a sheet to create under this name.
    Named(String),
    /// A fresh sheet with a unique "PDF Files" name.
    CreateNew,
}

impl SheetTarget {
    /// Interpret a user choice. The new-sheet label and blank input mean
    /// [`SheetTarget::CreateNew`].
    pub fn from_choice(choice: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() || choice == NEW_SHEET_LABEL {
            SheetTarget::CreateNew
        } else {
            SheetTarget::Named(choice.to_string())
        }
    }
}

/// Column headers for the active mapping.
///
/// An empty mapping gives the fixed three-column layout.
pub fn header_row(mapping: &FieldMapping) -> Vec<String> {
    let mut header = vec![FILENAME_HEADER.to_string()];
    if mapping.is_empty() {
        header.push(TOTAL_AMOUNT_HEADER.to_string());
    } else {
        header.extend(mapping.fields().iter().cloned());
    }
    header.push(LINK_HEADER.to_string());
    header
}

/// First free name among "PDF Files", "PDF Files 1", "PDF Files 2", ...
pub fn unique_sheet_name<S: AsRef<str>>(existing: &[S]) -> String {
    let taken = |name: &str| existing.iter().any(|s| s.as_ref() == name);
    if !taken(DEFAULT_SHEET_NAME) {
        return DEFAULT_SHEET_NAME.to_string();
    }
    (1..)
        .map(|n| format!("{DEFAULT_SHEET_NAME} {n}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string())
}
