//! Positioned text runs from pdf-extract, grouped into table rows.
//!
//! lopdf's page text loses glyph positions, so a table drawn cell by cell
//! comes out as one cell per line. Here each glyph keeps its baseline and x
//! position: glyphs on one baseline with no wide gap form a run, runs on one
//! baseline form a row, and consecutive rows of two or more runs form a table.

use std::panic::{AssertUnwindSafe, catch_unwind};

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, warn};

use super::Table;
use crate::error::PdfError;

/// Horizontal gap, in font sizes, that separates two cells.
const CELL_GAP: f64 = 1.0;
/// Vertical distance, in font sizes, within which glyphs share a baseline.
const BASELINE_TOLERANCE: f64 = 0.5;

/// Text drawn on one baseline without a wide gap.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    /// x position where the last glyph ends.
    pub end: f64,
    pub size: f64,
    pub text: String,
}

impl TextRun {
    fn continues_at(&self, x: f64, y: f64, size: f64) -> bool {
        let size = self.size.max(size);
        (y - self.y).abs() <= size * BASELINE_TOLERANCE
            && x >= self.x
            && x - self.end <= size * CELL_GAP
    }
}

#[derive(Default)]
struct RunCollector {
    runs: Vec<TextRun>,
    current: Option<TextRun>,
}

impl RunCollector {
    fn flush(&mut self) {
        if let Some(run) = self.current.take() {
            if !run.text.trim().is_empty() {
                self.runs.push(run);
            }
        }
    }
}

impl OutputDev for RunCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let size = font_size * (trm.m11 * trm.m22).abs().sqrt();
        let (x, y) = (trm.m31, trm.m32);
        let end = x + width * size;

        match self.current.as_mut() {
            Some(run) if run.continues_at(x, y, size) => {
                run.text.push_str(char);
                run.end = run.end.max(end);
            }
            _ => {
                self.flush();
                self.current = Some(TextRun {
                    x,
                    y,
                    end,
                    size,
                    text: char.to_string(),
                });
            }
        }
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Text runs of pages `1..=limit`, one vector per page.
///
/// A page pdf-extract cannot lay out (including one that makes it panic)
/// yields no runs.
pub fn page_runs(data: &[u8], limit: u32) -> Result<Vec<Vec<TextRun>>, PdfError> {
    let doc = pdf_extract::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut pages = Vec::with_capacity(limit as usize);
    for number in 1..=limit {
        let mut collector = RunCollector::default();
        let result = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc_page(&doc, &mut collector, number)
        }));
        match result {
            Ok(Ok(())) => collector.flush(),
            Ok(Err(e)) => {
                debug!("No layout for page {}: {}", number, e);
                collector.runs.clear();
            }
            Err(_) => {
                warn!("pdf-extract failed on page {}; skipping its layout", number);
                collector.runs.clear();
            }
        }
        pages.push(collector.runs);
    }
    Ok(pages)
}

/// Group runs into rows, top of the page first, each row left to right.
fn rows(runs: &[TextRun]) -> Vec<Vec<&TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match rows.last_mut() {
            Some(row) if (row[0].y - run.y).abs() <= row[0].size.max(run.size) * BASELINE_TOLERANCE => {
                row.push(run)
            }
            _ => rows.push(vec![run]),
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

/// Tables formed by consecutive rows of two or more runs.
///
/// Cells of later rows are placed under the column of the first row whose
/// span they start in, so a missing cell leaves an empty string.
pub fn tables_from_runs(runs: &[TextRun]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<&TextRun>> = Vec::new();

    for row in rows(runs) {
        if row.len() >= 2 {
            block.push(row);
        } else {
            push_block(&mut block, &mut tables);
        }
    }
    push_block(&mut block, &mut tables);
    tables
}

fn push_block(block: &mut Vec<Vec<&TextRun>>, tables: &mut Vec<Table>) {
    if block.len() >= 2 {
        tables.push(align(block));
    }
    block.clear();
}

fn align(block: &[Vec<&TextRun>]) -> Table {
    let starts: Vec<f64> = block[0].iter().map(|run| run.x).collect();
    let column = |x: f64| {
        starts
            .iter()
            .rposition(|start| x + 1.0 >= *start)
            .unwrap_or(0)
    };

    let rows = block
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if i == 0 {
                return row.iter().map(|run| run.text.trim().to_string()).collect();
            }
            let mut cells = vec![String::new(); starts.len()];
            for run in row {
                let cell = &mut cells[column(run.x)];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(run.text.trim());
            }
            cells
        })
        .collect();
    Table::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(x: f64, y: f64, text: &str) -> TextRun {
        TextRun {
            x,
            y,
            end: x + 6.0 * text.len() as f64,
            size: 10.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_runs_on_two_baselines_form_a_table() {
        let runs = vec![
            run(300.0, 700.0, "Date"),
            run(50.0, 700.0, "Invoice Number"),
            run(50.0, 686.0, "INV-100"),
            run(300.0, 686.0, "2024-01-01"),
        ];
        assert_eq!(
            tables_from_runs(&runs),
            [Table::from_rows([
                ["Invoice Number", "Date"],
                ["INV-100", "2024-01-01"],
            ])]
        );
    }

    #[test]
    fn test_missing_cell_keeps_its_column() {
        let runs = vec![
            run(50.0, 700.0, "Item"),
            run(200.0, 700.0, "Qty"),
            run(350.0, 700.0, "Amount"),
            run(50.0, 686.0, "Widget"),
            run(352.0, 686.0, "12.00"),
        ];
        let tables = tables_from_runs(&runs);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cell(1, 1), None);
        assert_eq!(tables[0].cell(1, 2), Some("12.00"));
    }

    #[test]
    fn test_single_run_rows_are_not_tables() {
        let runs = vec![
            run(50.0, 700.0, "Invoice Number: INV-7"),
            run(50.0, 686.0, "Total Amount: 12.00"),
        ];
        assert!(tables_from_runs(&runs).is_empty());
    }

    #[test]
    fn test_narrow_gap_continues_a_run() {
        let mut collector = RunCollector::default();
        let mut trm = Transform::identity();
        for (i, c) in ["A", "B"].into_iter().enumerate() {
            trm.m31 = 50.0 + 6.0 * i as f64;
            trm.m32 = 700.0;
            collector.output_character(&trm, 0.6, 0.0, 10.0, c).unwrap();
        }
        trm.m31 = 200.0;
        collector.output_character(&trm, 0.6, 0.0, 10.0, "C").unwrap();
        collector.end_page().unwrap();

        let texts: Vec<&str> = collector.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["AB", "C"]);
    }
}
