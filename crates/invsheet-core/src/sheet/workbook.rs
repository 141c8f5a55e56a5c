//! Workbook access: calamine reads, rust_xlsxwriter creates new files and
//! edit_xlsx changes existing ones in place.
//!
//! [`Workbook::open`] loads cell values into memory. Edits are tracked per
//! cell, and [`Workbook::save_changes`] writes only those cells back, so
//! formats, dates, merged cells and untouched sheets of an existing file
//! stay as they were.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use edit_xlsx::Write as _;
use rust_xlsxwriter::{Color, Format, FormatUnderline, Formula, Worksheet};
use tracing::debug;

use super::FILENAME_HEADER;
use crate::error::SheetError;

/// Windows "file in use" OS errors.
const SHARING_VIOLATION: i32 = 32;
const LOCK_VIOLATION: i32 = 33;

/// Messages edit_xlsx passes through from the OS when a file is in use or
/// not writable.
const LOCKED_MESSAGES: [&str; 3] = ["Permission denied", "being used", "os error 32"];

const FILENAME_COLUMN_WIDTH: f64 = 40.0;
const COLUMN_WIDTH: f64 = 20.0;
const LINK_COLOR: u32 = 0x0563C1;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula text (without the leading `=`) and its cached display result.
    Formula { formula: String, result: String },
}

impl CellValue {
    fn from_data(data: &Data) -> Option<Self> {
        match data {
            Data::Empty => None,
            Data::String(s) if s.is_empty() => None,
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            other => Some(CellValue::Text(other.to_string())),
        }
    }

    /// The value as Excel would display it.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Formula { result, .. } => result.clone(),
        }
    }

    fn is_link(&self) -> bool {
        matches!(self, CellValue::Formula { formula, .. } if formula.trim_start_matches('=').starts_with("HYPERLINK("))
    }
}

/// Display text of a `HYPERLINK(target, text)` formula.
fn link_label(formula: &str) -> Option<String> {
    let body = formula.trim_start_matches('=').strip_prefix("HYPERLINK(")?;
    let (_, label) = body.rsplit_once(",\"")?;
    Some(label.strip_suffix("\")")?.replace("\"\"", "\""))
}

/// A worksheet as a sparse grid keyed by zero-based (row, column).
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
    /// Cells set or removed since the sheet was loaded.
    changed: BTreeSet<(u32, u16)>,
    /// Not yet present in the file.
    created: bool,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            changed: BTreeSet::new(),
            created: true,
        }
    }

    fn loaded(name: impl Into<String>) -> Self {
        Self {
            created: false,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Displayed text of a cell.
    pub fn text(&self, row: u32, col: u16) -> Option<String> {
        self.get(row, col).map(CellValue::display)
    }

    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        self.cells.insert((row, col), value);
        self.changed.insert((row, col));
    }

    /// Whether the sheet differs from the file it was loaded from.
    pub fn is_changed(&self) -> bool {
        self.created || !self.changed.is_empty()
    }

    /// Index of the last row holding any cell.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().map(|(row, _)| *row).max()
    }

    /// Number of rows below the header that hold any cell.
    pub fn data_row_count(&self) -> usize {
        let mut rows: Vec<u32> = self.cells.keys().map(|(r, _)| *r).filter(|r| *r > 0).collect();
        rows.dedup();
        rows.len()
    }

    /// Remove every cell in a row.
    pub fn clear_row(&mut self, row: u32) {
        self.remove_where(|r| r == row);
    }

    /// Remove every row below `row`.
    pub fn truncate_below(&mut self, row: u32) {
        self.remove_where(|r| r > row);
    }

    fn remove_where(&mut self, remove: impl Fn(u32) -> bool) {
        let changed = &mut self.changed;
        self.cells.retain(|&(r, c), _| {
            if remove(r) {
                changed.insert((r, c));
                false
            } else {
                true
            }
        });
    }

    /// Whether row 0 carries the invoice header.
    fn is_invoice_sheet(&self) -> bool {
        self.text(0, 0).as_deref() == Some(FILENAME_HEADER)
    }

    fn write_to(&self, worksheet: &mut Worksheet) -> Result<(), SheetError> {
        worksheet.set_name(&self.name)?;

        let styled = self.is_invoice_sheet();
        let header_format = Format::new().set_bold();
        let link_format = Format::new()
            .set_font_color(Color::RGB(LINK_COLOR))
            .set_underline(FormatUnderline::Single);

        for (&(row, col), value) in &self.cells {
            let format = match (styled, row, value.is_link()) {
                (true, 0, _) => Some(&header_format),
                (true, _, true) => Some(&link_format),
                _ => None,
            };
            write_cell(worksheet, row, col, value, format)?;
        }

        if styled {
            let width = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
            worksheet.set_column_width(0, FILENAME_COLUMN_WIDTH)?;
            for col in 1..=width {
                worksheet.set_column_width(col, COLUMN_WIDTH)?;
            }
        }
        Ok(())
    }

    /// Write the changed cells into an edit_xlsx worksheet. Removed cells
    /// become empty strings, which read back as empty. Numbers and booleans
    /// are written as their displayed text.
    fn patch(&self, worksheet: &mut edit_xlsx::WorkSheet) -> Result<(), String> {
        let header_format = edit_xlsx::Format::default().set_bold();
        let styled = self.is_invoice_sheet();

        for &(row, col) in &self.changed {
            let reference = cell_reference(row, col);
            let result = match self.cells.get(&(row, col)) {
                None => worksheet.write_string(&reference, String::new()),
                Some(CellValue::Formula { formula, .. }) => {
                    worksheet.write_formula(&reference, formula.trim_start_matches('='))
                }
                Some(value) if styled && row == 0 => {
                    worksheet.write_string_with_format(&reference, value.display(), &header_format)
                }
                Some(value) => worksheet.write_string(&reference, value.display()),
            };
            result.map_err(|e| format!("{reference}: {e}"))?;
        }
        Ok(())
    }
}

/// A1-style reference of a zero-based cell.
fn cell_reference(row: u32, col: u16) -> String {
    let mut letters = Vec::new();
    let mut n = u32::from(col) + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<(), SheetError> {
    match (value, format) {
        (CellValue::Text(s), Some(f)) => worksheet.write_string_with_format(row, col, s, f)?,
        (CellValue::Text(s), None) => worksheet.write_string(row, col, s)?,
        (CellValue::Number(n), Some(f)) => worksheet.write_number_with_format(row, col, *n, f)?,
        (CellValue::Number(n), None) => worksheet.write_number(row, col, *n)?,
        (CellValue::Bool(b), Some(f)) => worksheet.write_boolean_with_format(row, col, *b, f)?,
        (CellValue::Bool(b), None) => worksheet.write_boolean(row, col, *b)?,
        (CellValue::Formula { formula, result }, format) => {
            let formula = Formula::new(formula).set_result(result);
            match format {
                Some(f) => worksheet.write_formula_with_format(row, col, formula, f)?,
                None => worksheet.write_formula(row, col, formula)?,
            }
        }
    };
    Ok(())
}

/// All sheets of a workbook, in tab order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every sheet of an existing workbook.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        if !path.exists() {
            return Err(SheetError::Missing(path.to_path_buf()));
        }
        let mut reader = open_workbook_auto(path).map_err(|e| open_error(path, e))?;
        let names = reader.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let mut sheet = Sheet::loaded(name.clone());

            let values = reader
                .worksheet_range(&name)
                .map_err(|e| open_error(path, e))?;
            if let Some((row0, col0)) = values.start() {
                for (r, c, data) in values.used_cells() {
                    if let Some(value) = CellValue::from_data(data) {
                        sheet
                            .cells
                            .insert((row0 + r as u32, (col0 as usize + c) as u16), value);
                    }
                }
            }

            let formulas = reader
                .worksheet_formula(&name)
                .map_err(|e| open_error(path, e))?;
            if let Some((row0, col0)) = formulas.start() {
                for (r, c, formula) in formulas.used_cells() {
                    if formula.is_empty() {
                        continue;
                    }
                    let (row, col) = (row0 + r as u32, (col0 as usize + c) as u16);
                    // Formulas written in place carry no cached value.
                    let result = sheet
                        .text(row, col)
                        .or_else(|| link_label(formula))
                        .unwrap_or_default();
                    sheet.cells.insert(
                        (row, col),
                        CellValue::Formula {
                            formula: formula.clone(),
                            result,
                        },
                    );
                }
            }

            debug!("Read sheet '{}' with {} cells", sheet.name, sheet.cells.len());
            sheets.push(sheet);
        }

        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Append an empty sheet and return its index.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> usize {
        self.sheets.push(Sheet::new(name));
        self.sheets.len() - 1
    }

    /// Serialize to xlsx bytes.
    pub fn to_buffer(&self) -> Result<Vec<u8>, SheetError> {
        let mut out = rust_xlsxwriter::Workbook::new();
        for sheet in &self.sheets {
            sheet.write_to(out.add_worksheet())?;
        }
        Ok(out.save_to_buffer()?)
    }

    /// Write the whole workbook to `path` as a new file, replacing any file
    /// there in one step.
    ///
    /// The bytes go to a temporary file in the same directory first, so a
    /// failed save leaves the existing file untouched.
    pub fn save(&self, path: &Path) -> Result<(), SheetError> {
        let buffer = self.to_buffer()?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path))
            .map_err(|e| write_error(path, e))?;
        tmp.write_all(&buffer).map_err(|e| write_error(path, e))?;
        tmp.persist(path).map_err(|e| write_error(path, e.error))?;

        debug!("Saved {} ({} bytes)", path.display(), buffer.len());
        Ok(())
    }

    /// Write changed cells and new sheets into the existing workbook at
    /// `path`. Everything else in the file is kept as is.
    ///
    /// The edited copy is saved next to the target and then moved over it.
    pub fn save_changes(&self, path: &Path) -> Result<(), SheetError> {
        let changed: Vec<&Sheet> = self.sheets.iter().filter(|s| s.is_changed()).collect();
        if changed.is_empty() {
            return Ok(());
        }

        let mut book = edit_xlsx::Workbook::from_path(path).map_err(|e| edit_error(path, e))?;
        for sheet in &changed {
            let worksheet = if sheet.created {
                book.add_worksheet_by_name(&sheet.name)
                    .map_err(|e| edit_error(path, e))?
            } else {
                book.get_worksheet_mut_by_name(&sheet.name)
                    .map_err(|e| edit_error(path, e))?
            };
            sheet.patch(worksheet).map_err(|reason| SheetError::Save {
                path: path.to_path_buf(),
                reason,
            })?;
        }

        let tmp = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile_in(parent_dir(path))
            .map_err(|e| write_error(path, e))?
            .into_temp_path();
        book.save_as(&tmp).map_err(|e| save_error(path, e))?;
        tmp.persist(path).map_err(|e| write_error(path, e.error))?;

        debug!(
            "Updated {} ({} sheet(s) changed)",
            path.display(),
            changed.len()
        );
        Ok(())
    }
}

/// Directory of `path`, `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn is_locked(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::PermissionDenied
        || (cfg!(windows)
            && matches!(error.raw_os_error(), Some(SHARING_VIOLATION | LOCK_VIOLATION)))
}

fn is_locked_message(message: &str) -> bool {
    LOCKED_MESSAGES.iter().any(|m| message.contains(m))
}

fn open_error(path: &Path, error: calamine::Error) -> SheetError {
    match error {
        calamine::Error::Io(e) if is_locked(&e) => SheetError::Locked {
            path: path.to_path_buf(),
        },
        other => SheetError::Open {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn edit_error(path: &Path, error: impl std::fmt::Display) -> SheetError {
    let reason = error.to_string();
    if is_locked_message(&reason) {
        SheetError::Locked {
            path: path.to_path_buf(),
        }
    } else {
        SheetError::Open {
            path: path.to_path_buf(),
            reason,
        }
    }
}

fn save_error(path: &Path, error: impl std::fmt::Display) -> SheetError {
    let reason = error.to_string();
    if is_locked_message(&reason) {
        SheetError::Locked {
            path: path.to_path_buf(),
        }
    } else {
        SheetError::Save {
            path: path.to_path_buf(),
            reason,
        }
    }
}

fn write_error(path: &Path, error: std::io::Error) -> SheetError {
    let path: PathBuf = path.to_path_buf();
    if is_locked(&error) {
        SheetError::Locked { path }
    } else {
        SheetError::Write {
            path,
            source: error,
        }
    }
}
