//! Common regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Amount token: digits with optional thousands separators and decimals.
const AMOUNT: &str = r"([0-9][0-9,]*(?:\.[0-9]+)?)";

/// Optional currency prefix in front of an amount.
const CURRENCY: &str = r"(?:USD|EUR|GBP|\$|€|£)?\s*";

/// ISO, slashed/dotted, or spelled-out month dates.
const DATE: &str = r"([0-9]{4}[./-][0-9]{1,2}[./-][0-9]{1,2}|[0-9]{1,2}[./-][0-9]{1,2}[./-][0-9]{2,4}|[A-Za-z]{3,9}\.?\s+[0-9]{1,2},?\s+[0-9]{4}|[0-9]{1,2}\s+[A-Za-z]{3,9}\.?\s+[0-9]{4})";

/// Identifier containing at least one digit.
const IDENTIFIER: &str = r"([A-Za-z0-9\-/_.]*[0-9][A-Za-z0-9\-/_.]*)";

fn amount_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?i){label}\s*[:\-]?\s*{CURRENCY}{AMOUNT}")).unwrap()
}

lazy_static! {
    /// Known fields matched line by line, in priority order.
    pub static ref KNOWN_FIELDS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(&format!(r"(?i)\binvoice\s*(?:number|num\.?|no\.?|#)\s*[:#]?\s*{IDENTIFIER}")).unwrap(),
            "Invoice Number",
        ),
        (
            Regex::new(&format!(r"(?i)\b(?:invoice|issue)\s*date\s*[:\-]?\s*{DATE}")).unwrap(),
            "Invoice Date",
        ),
        (
            Regex::new(&format!(r"(?i)\bdue\s*(?:date|on)\s*[:\-]?\s*{DATE}")).unwrap(),
            "Due Date",
        ),
        (amount_pattern(r"\btotal\s*amount(?:\s*due)?"), "Total Amount"),
        (amount_pattern(r"\bsub\s*-?\s*total"), "Subtotal"),
        (amount_pattern(r"\b(?:tax|vat|gst)\b(?:\s*\([^)]*\))?"), "Tax"),
        (amount_pattern(r"\b(?:amount|balance)\s*due"), "Amount Due"),
        (
            Regex::new(r"(?i)\b(?:customer|client|bill\s*to|sold\s*to)(?:\s*name)?\s*[:\-]\s*(.+)").unwrap(),
            "Customer",
        ),
        (
            Regex::new(r"(?i)\b(?:vendor|supplier|seller)(?:\s*name)?\s*[:\-]\s*(.+)").unwrap(),
            "Vendor",
        ),
        (
            Regex::new(&format!(r"(?i)\b(?:p\.?\s?o\b\.?|purchase\s*order)(?:\s*(?:number|no\.?|#))?\s*[:#]?\s*{IDENTIFIER}")).unwrap(),
            "PO Number",
        ),
    ];

    // Default total-amount extraction, in the order they are tried.
    pub static ref TOTAL_AMOUNT_THEN_USD: Regex = Regex::new(
        r"(?is)Total Amount.*?USD\s*([0-9,]+\.?[0-9]*)"
    ).unwrap();

    pub static ref USD_AMOUNT: Regex = Regex::new(
        r"USD\s*([0-9,]+\.?[0-9]*)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT_FALLBACKS: [Regex; 2] = [
        Regex::new(r"(?i)Total Amount[:\s]+(?:USD|\$)\s*([0-9,]+\.?[0-9]*)").unwrap(),
        Regex::new(r"(?i)Total Amount[:\s]+([0-9,]+\.?[0-9]*)").unwrap(),
    ];

    /// What a cleaned amount must look like.
    pub static ref PLAIN_NUMBER: Regex = Regex::new(r"^[0-9.]+$").unwrap();
}
