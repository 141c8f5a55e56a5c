//! Rule-based field extractors for invoice pages.

pub mod amounts;
pub mod lines;
pub mod patterns;
pub mod tables;

pub use amounts::{extract_default_amount, normalize_amount};
pub use lines::{ColonLines, KnownPatterns, LabelLines};
pub use tables::TableColumns;

use crate::models::FieldMap;
use crate::pdf::PdfPage;

/// Labels must be shorter than this many characters.
pub const MAX_LABEL_LEN: usize = 50;

/// Values must be shorter than this many characters.
pub const MAX_VALUE_LEN: usize = 200;

/// One extraction pass over a page.
///
/// Rules only add fields that are not already present, so earlier rules and
/// earlier pages take priority.
pub trait FieldRule: Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Record every field this rule finds on the page.
    fn apply(&self, page: &PdfPage, fields: &mut FieldMap);
}

/// The four passes, in the order they run on each page.
pub fn default_rules() -> [&'static dyn FieldRule; 4] {
    [&TableColumns, &ColonLines, &KnownPatterns, &LabelLines]
}

/// Insert a field unless its name is already captured.
pub(crate) fn record(fields: &mut FieldMap, name: &str, value: &str) -> bool {
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() || fields.contains_key(name) {
        return false;
    }
    fields.insert(name.to_string(), value.to_string());
    true
}

/// Whether a label/value pair fits the length bounds.
pub(crate) fn within_bounds(label: &str, value: &str) -> bool {
    label.chars().count() < MAX_LABEL_LEN && value.chars().count() < MAX_VALUE_LEN
}
