//! Line-based passes: "Label: Value" lines, known patterns, and label lines
//! followed by their value.

use super::patterns::KNOWN_FIELDS;
use super::{FieldRule, MAX_LABEL_LEN, MAX_VALUE_LEN, record, within_bounds};
use crate::models::FieldMap;
use crate::pdf::PdfPage;

/// Words that make a short line look like a label.
const LABEL_KEYWORDS: [&str; 10] = [
    "number", "date", "name", "id", "code", "amount", "total", "address", "email", "phone",
];

/// Split a line on its first colon into a non-empty (label, value) pair.
pub fn colon_pair(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(':')?;
    let (label, value) = (label.trim(), value.trim());
    (!label.is_empty() && !value.is_empty()).then_some((label, value))
}

/// "Label: Value" on a single line.
pub struct ColonLines;

impl FieldRule for ColonLines {
    fn name(&self) -> &'static str {
        "colon"
    }

    fn apply(&self, page: &PdfPage, fields: &mut FieldMap) {
        for (label, value) in page.lines().filter_map(colon_pair) {
            if within_bounds(label, value) {
                record(fields, label, value);
            }
        }
    }
}

/// Canonical invoice fields recognized by regex anywhere in a line.
pub struct KnownPatterns;

impl FieldRule for KnownPatterns {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn apply(&self, page: &PdfPage, fields: &mut FieldMap) {
        for line in page.lines() {
            for (pattern, name) in KNOWN_FIELDS.iter() {
                if fields.contains_key(*name) {
                    continue;
                }
                let Some(value) = pattern.captures(line).and_then(|caps| caps.get(1)) else {
                    continue;
                };
                let value = value.as_str().trim().trim_end_matches([',', ';']);
                if value.chars().count() < MAX_VALUE_LEN {
                    record(fields, name, value);
                }
            }
        }
    }
}

/// A short line mentioning a label keyword, with its value on the next line.
pub struct LabelLines;

impl LabelLines {
    fn is_label(line: &str) -> bool {
        if line.chars().count() >= MAX_LABEL_LEN || colon_pair(line).is_some() {
            return false;
        }
        let lower = line.to_lowercase();
        LABEL_KEYWORDS.iter().any(|k| lower.contains(k))
    }
}

impl FieldRule for LabelLines {
    fn name(&self) -> &'static str {
        "label"
    }

    fn apply(&self, page: &PdfPage, fields: &mut FieldMap) {
        let lines: Vec<&str> = page.lines().collect();
        for pair in lines.windows(2) {
            let (label, value) = (pair[0], pair[1]);
            if !Self::is_label(label) || value.chars().count() >= MAX_VALUE_LEN {
                continue;
            }
            let label = label.trim_end_matches(':').trim_end();
            record(fields, label, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(rule: &dyn FieldRule, text: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        rule.apply(&PdfPage::from_text(1, text), &mut fields);
        fields
    }

    fn pairs(fields: &FieldMap) -> Vec<(&str, &str)> {
        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_colon_lines_split_on_first_colon() {
        let fields = run(
            &ColonLines,
            "Invoice Date: 2024-01-01 10:30\nRef:\n: orphan\nInvoice Date: 1999-01-01",
        );
        assert_eq!(pairs(&fields), vec![("Invoice Date", "2024-01-01 10:30")]);
    }

    #[test]
    fn test_colon_lines_length_bounds() {
        let long_label = format!("{}: value", "L".repeat(60));
        let long_value = format!("Note: {}", "v".repeat(250));
        let fields = run(&ColonLines, &format!("{long_label}\n{long_value}\nOk: yes"));
        assert_eq!(pairs(&fields), vec![("Ok", "yes")]);
    }

    #[test]
    fn test_known_patterns_canonical_names() {
        let fields = run(
            &KnownPatterns,
            "ACME Invoice No. A-17 dated today\nSubtotal 1,000.00\nSales Tax 80.00\nBill To - Globex Inc\nSubtotal 5.00",
        );
        assert_eq!(
            pairs(&fields),
            vec![
                ("Invoice Number", "A-17"),
                ("Subtotal", "1,000.00"),
                ("Tax", "80.00"),
                ("Customer", "Globex Inc"),
            ]
        );
    }

    #[test]
    fn test_label_lines_pair_with_next_line() {
        let fields = run(&LabelLines, "Customer Name\nJane Doe\nPhone\n+1 555 0100\nThanks");
        assert_eq!(
            pairs(&fields),
            vec![("Customer Name", "Jane Doe"), ("Phone", "+1 555 0100")]
        );
    }

    #[test]
    fn test_label_lines_skip_colon_pairs_and_long_lines() {
        let long = format!("{} number", "word ".repeat(10));
        let fields = run(&LabelLines, &format!("Date: 2024-01-01\nnext\n{long}\nvalue"));
        assert!(fields.is_empty());
    }

    #[test]
    fn test_label_lines_strip_trailing_colon() {
        let fields = run(&LabelLines, "Account Code:\nX-9");
        assert_eq!(pairs(&fields), vec![("Account Code", "X-9")]);
    }
}
