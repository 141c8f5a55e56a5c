//! Header/column scan over detected tables.

use super::{FieldRule, record};
use crate::models::FieldMap;
use crate::pdf::PdfPage;

/// Rows below a header searched for its value.
const ROWS_BELOW_HEADER: usize = 5;

/// Treats row 0 of each table as headers and takes the first non-empty cell
/// below each header as its value.
pub struct TableColumns;

impl FieldRule for TableColumns {
    fn name(&self) -> &'static str {
        "table"
    }

    fn apply(&self, page: &PdfPage, fields: &mut FieldMap) {
        for table in page.tables.iter().filter(|t| t.row_count() >= 2) {
            let width = table.rows()[0].len();
            for col in 0..width {
                let Some(header) = table.cell(0, col) else {
                    continue;
                };
                let last = (1 + ROWS_BELOW_HEADER).min(table.row_count());
                if let Some(value) = (1..last).find_map(|row| table.cell(row, col)) {
                    record(fields, header, value);
                }
            }
        }
    }
}
