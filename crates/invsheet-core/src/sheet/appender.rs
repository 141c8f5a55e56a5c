//! Appends extracted records to a workbook sheet.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::workbook::{CellValue, Sheet, Workbook, parent_dir};
use super::{DEFAULT_LINK_TEXT, FILENAME_HEADER, NEW_SHEET_LABEL, SheetTarget};
use super::{header_row, unique_sheet_name};
use crate::error::SheetError;
use crate::models::{FieldMapping, PdfRecord};

/// What an append did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendOutcome {
    /// Workbook written.
    pub path: PathBuf,
    /// Sheet that received the rows.
    pub sheet: String,
    /// Rows added.
    pub appended: usize,
    /// Records skipped because their filename was already present.
    pub duplicates: usize,
    pub created_file: bool,
    pub created_sheet: bool,
}

/// Writes records below the existing rows of a sheet.
#[derive(Debug, Clone)]
pub struct SheetAppender {
    link_text: String,
}

impl SheetAppender {
    pub fn new() -> Self {
        Self {
            link_text: DEFAULT_LINK_TEXT.to_string(),
        }
    }

    /// Set the displayed text of the link column.
    pub fn with_link_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.link_text = text;
        }
        self
    }

    /// Append `records` to the chosen sheet of the workbook at `path`.
    ///
    /// The workbook and sheet are created when missing. A record whose
    /// filename is already in column A, or earlier in the same batch, is
    /// counted as a duplicate and skipped. An existing workbook is edited in
    /// place: only the new rows, a rewritten header or a new sheet are
    /// written. Nothing is saved when the workbook did not change.
    pub fn append(
        &self,
        records: &[PdfRecord],
        path: &Path,
        target: &SheetTarget,
        mapping: &FieldMapping,
    ) -> Result<AppendOutcome, SheetError> {
        let created_file = !path.exists();
        let mut book = if created_file {
            Workbook::new()
        } else {
            Workbook::open(path)?
        };

        let (index, created_sheet) = resolve_sheet(&mut book, target);
        let header = header_row(mapping);
        let sheet = book
            .sheet_at_mut(index)
            .ok_or_else(|| SheetError::SheetNotFound(sheet_label(target)))?;
        let sheet_name = sheet.name().to_string();

        let header_written = ensure_header(sheet, &header);

        let mut seen = existing_filenames(sheet);
        let mut next_row = sheet.last_row().map_or(1, |row| (row + 1).max(1));
        let link_col = (header.len() - 1) as u16;
        let value_cols = header.len() - 2;
        let base = parent_dir(path);

        let mut appended = 0;
        let mut duplicates = 0;
        for record in records {
            if !seen.insert(record.filename().to_string()) {
                debug!("Skipping duplicate {}", record.filename());
                duplicates += 1;
                continue;
            }

            sheet.set(next_row, 0, CellValue::Text(record.filename().to_string()));
            for (i, value) in record.values().iter().take(value_cols).enumerate() {
                if !value.is_empty() {
                    sheet.set(next_row, (i + 1) as u16, CellValue::Text(value.clone()));
                }
            }
            sheet.set(
                next_row,
                link_col,
                hyperlink(&link_target(record.source_path(), base), &self.link_text),
            );
            next_row += 1;
            appended += 1;
        }

        if created_file {
            book.save(path)?;
        } else if appended > 0 || header_written || created_sheet {
            book.save_changes(path)?;
        }

        info!(
            "Appended {} row(s) to '{}' in {} ({} duplicate(s))",
            appended,
            sheet_name,
            path.display(),
            duplicates
        );

        Ok(AppendOutcome {
            path: path.to_path_buf(),
            sheet: sheet_name,
            appended,
            duplicates,
            created_file,
            created_sheet,
        })
    }
}

impl Default for SheetAppender {
    fn default() -> Self {
        Self::new()
    }
}

/// Append with the default link text.
pub fn append_records(
    records: &[PdfRecord],
    path: &Path,
    target: &SheetTarget,
    mapping: &FieldMapping,
) -> Result<AppendOutcome, SheetError> {
    SheetAppender::new().append(records, path, target, mapping)
}

/// Sheet names of an existing workbook, in tab order.
pub fn list_sheets(path: &Path) -> Result<Vec<String>, SheetError> {
    let book = Workbook::open(path)?;
    Ok(book.sheet_names().into_iter().map(str::to_string).collect())
}

/// Choices offered for a destination: the new-sheet label, then the
/// existing sheets. A missing workbook only offers the label.
pub fn sheet_choices(path: &Path) -> Result<Vec<String>, SheetError> {
    let mut choices = vec![NEW_SHEET_LABEL.to_string()];
    if path.exists() {
        choices.extend(list_sheets(path)?);
    }
    Ok(choices)
}

/// Remove every row below the header. Returns the number of rows removed.
pub fn clear_sheet(path: &Path, name: &str) -> Result<usize, SheetError> {
    let mut book = Workbook::open(path)?;
    let index = book
        .sheet_index(name)
        .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;
    let sheet = book
        .sheet_at_mut(index)
        .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;

    let removed = sheet.data_row_count();
    sheet.truncate_below(0);
    book.save_changes(path)?;

    info!("Cleared {} row(s) from '{}'", removed, name);
    Ok(removed)
}

fn sheet_label(target: &SheetTarget) -> String {
    match target {
        SheetTarget::Named(name) => name.clone(),
        SheetTarget::CreateNew => NEW_SHEET_LABEL.to_string(),
    }
}

/// Index of the target sheet, creating it when needed.
fn resolve_sheet(book: &mut Workbook, target: &SheetTarget) -> (usize, bool) {
    let name = match target {
        SheetTarget::Named(name) if !name.trim().is_empty() => {
            if let Some(index) = book.sheet_index(name) {
                return (index, false);
            }
            name.clone()
        }
        _ => unique_sheet_name(&book.sheet_names()),
    };
    debug!("Creating sheet '{}'", name);
    (book.add_sheet(name), true)
}

/// Write the header when the sheet has no data rows or row 1 is not an
/// invoice header. Returns whether row 1 was rewritten.
fn ensure_header(sheet: &mut Sheet, header: &[String]) -> bool {
    let has_rows = sheet.last_row().is_some_and(|row| row >= 1);
    let matches = sheet.text(0, 0).as_deref() == Some(FILENAME_HEADER);
    if has_rows && matches {
        return false;
    }

    sheet.clear_row(0);
    for (col, title) in header.iter().enumerate() {
        sheet.set(0, col as u16, CellValue::Text(title.clone()));
    }
    true
}

/// Non-blank filenames already in column A below the header.
fn existing_filenames(sheet: &Sheet) -> HashSet<String> {
    let Some(last) = sheet.last_row() else {
        return HashSet::new();
    };
    (1..=last)
        .filter_map(|row| sheet.text(row, 0))
        .filter(|name| !name.trim().is_empty())
        .collect()
}

fn hyperlink(target: &str, text: &str) -> CellValue {
    CellValue::Formula {
        formula: format!(
            "HYPERLINK(\"{}\",\"{}\")",
            target.replace('"', "\"\""),
            text.replace('"', "\"\"")
        ),
        result: text.to_string(),
    }
}

/// Path of `source` relative to `base`, with forward slashes. Falls back to
/// the absolute path when the two share no root.
fn link_target(source: &Path, base: &Path) -> String {
    let source = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    let base = std::path::absolute(base).unwrap_or_else(|_| base.to_path_buf());
    let path = relative_path(&source, &base).unwrap_or(source);
    path.to_string_lossy().replace('\\', "/")
}

fn relative_path(target: &Path, base: &Path) -> Option<PathBuf> {
    let mut target = target.components().peekable();
    let mut base = base.components().peekable();
    while let (Some(a), Some(b)) = (target.peek(), base.peek()) {
        if a != b {
            break;
        }
        target.next();
        base.next();
    }

    let mut relative = PathBuf::new();
    for component in base {
        match component {
            Component::Normal(_) => relative.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    relative.extend(target);
    Some(relative)
}
