//! Total amount extraction for the legacy single-column schema.

use tracing::trace;

use super::patterns::{PLAIN_NUMBER, TOTAL_AMOUNT_FALLBACKS, TOTAL_AMOUNT_THEN_USD, USD_AMOUNT};
use crate::pdf::{PdfPage, Table};

const TOTAL_AMOUNT: &str = "Total Amount";

/// Lines after a "Total Amount" line searched for a USD token.
const USD_LOOKAHEAD: usize = 5;

/// Find the invoice total across pages, trying tables before text on each page.
pub fn extract_default_amount(pages: &[PdfPage]) -> Option<String> {
    pages.iter().find_map(|page| {
        let amount = page
            .tables
            .iter()
            .find_map(amount_from_table)
            .or_else(|| amount_from_text(&page.text));
        if let Some(amount) = &amount {
            trace!("Total amount {} found on page {}", amount, page.number);
        }
        amount
    })
}

/// Strip thousands separators and currency tokens, keeping only plain numbers.
pub fn normalize_amount(raw: &str) -> Option<String> {
    let cleaned = raw
        .replace(',', "")
        .replace("USD", "")
        .replace('$', "")
        .trim()
        .to_string();
    PLAIN_NUMBER.is_match(&cleaned).then_some(cleaned)
}

/// First numeric cell below any "Total Amount" cell in the same column.
fn amount_from_table(table: &Table) -> Option<String> {
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if !cell.contains(TOTAL_AMOUNT) {
                continue;
            }
            let below = (row_idx + 1..table.row_count()).filter_map(|r| table.cell(r, col_idx));
            for value in below {
                if let Some(amount) = normalize_amount(value) {
                    return Some(amount);
                }
            }
        }
    }
    None
}

fn amount_from_text(text: &str) -> Option<String> {
    if let Some(amount) = first_capture(&TOTAL_AMOUNT_THEN_USD, text) {
        return Some(amount);
    }

    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(TOTAL_AMOUNT) {
            continue;
        }
        let window = &lines[i..(i + USD_LOOKAHEAD).min(lines.len())];
        if let Some(amount) = window.iter().find_map(|l| first_capture(&USD_AMOUNT, l)) {
            return Some(amount);
        }
    }

    TOTAL_AMOUNT_FALLBACKS
        .iter()
        .find_map(|re| first_capture(re, text))
}

fn first_capture(re: &regex::Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| normalize_amount(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(text: &str) -> PdfPage {
        PdfPage::from_text(1, text)
    }

    #[test]
    fn test_due_date_between_label_and_amount() {
        let pages = [page("Summary\nTotal Amount Due on 2024-01-01 USD 239.40\nThank you")];
        assert_eq!(extract_default_amount(&pages), Some("239.40".to_string()));
    }

    #[test]
    fn test_table_column_below_header() {
        let mut p = page("");
        p.tables.push(Table::from_rows([
            ["Description", "Total Amount"],
            ["Consulting", ""],
            ["", "USD 1,250.00"],
        ]));
        assert_eq!(extract_default_amount(&[p]), Some("1250.00".to_string()));
    }

    #[test]
    fn test_table_skips_non_numeric_cells() {
        let mut p = page("");
        p.tables.push(Table::from_rows([
            ["Total Amount"],
            ["see attached"],
            ["99.10"],
        ]));
        assert_eq!(extract_default_amount(&[p]), Some("99.10".to_string()));
    }

    #[test]
    fn test_fallback_without_currency() {
        let pages = [page("Total Amount: 1,024.5")];
        assert_eq!(extract_default_amount(&pages), Some("1024.5".to_string()));
    }

    #[test]
    fn test_fallback_with_dollar_sign() {
        let pages = [page("total amount $ 87.00")];
        assert_eq!(extract_default_amount(&pages), Some("87.00".to_string()));
    }

    #[test]
    fn test_earlier_page_wins() {
        let pages = [
            page("Cover letter"),
            page("Total Amount USD 10.00"),
            page("Total Amount USD 20.00"),
        ];
        assert_eq!(extract_default_amount(&pages), Some("10.00".to_string()));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(extract_default_amount(&[page("Amount payable 12.00")]), None);
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount(" USD 1,234.56 "), Some("1234.56".to_string()));
        assert_eq!(normalize_amount("$99"), Some("99".to_string()));
        assert_eq!(normalize_amount("12 EUR"), None);
        assert_eq!(normalize_amount(","), None);
    }
}
