//! Table detection from laid-out page text.
//!
//! A line is a table row when it splits into two or more cells on tabs, pipes
//! or runs of two or more spaces. Consecutive rows form a table.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CELL_SEPARATOR: Regex = Regex::new(r"\t+|\s*\|\s*|\s{2,}").unwrap();
}

/// A table as a grid of trimmed cell strings. Empty cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a table from any nested collection of string-like cells.
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|c| c.as_ref().trim().to_string()).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Non-empty trimmed cell content.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

/// Detect tables in page text.
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        match split_cells(line) {
            Some(cells) => current.push(cells),
            None => flush(&mut current, &mut tables),
        }
    }
    flush(&mut current, &mut tables);

    tables
}

fn flush(current: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if current.len() >= 2 {
        tables.push(Table::new(std::mem::take(current)));
    } else {
        current.clear();
    }
}

fn split_cells(line: &str) -> Option<Vec<String>> {
    let line = line.trim().trim_matches('|').trim();
    if line.is_empty() {
        return None;
    }
    let cells: Vec<String> = CELL_SEPARATOR
        .split(line)
        .map(|c| c.trim().to_string())
        .collect();
    (cells.len() >= 2).then_some(cells)
}
