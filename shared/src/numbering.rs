//! Document numbering
//!
//! Movement documents are numbered `{CODE}-{MM}{YY}-{NNNN}`, for example
//! `SM-0625-0001` for the first inbound document dated June 2025. The
//! sequence restarts for every prefix and grows past four digits if needed.

use chrono::{Datelike, NaiveDate};

use crate::models::DocumentKind;

/// Minimum width of the zero-padded sequence
pub const SEQUENCE_WIDTH: usize = 4;

/// Prefix shared by every document of `kind` dated in the month of `date`
pub fn document_prefix(kind: DocumentKind, date: NaiveDate) -> String {
    format!("{}-{:02}{:02}", kind.code(), date.month(), date.year().rem_euclid(100))
}

/// Format a document number from a prefix and sequence
pub fn format_document_number(prefix: &str, sequence: u32) -> String {
    format!("{}-{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// Extract the sequence from `number` if it belongs to `prefix`
pub fn parse_sequence(number: &str, prefix: &str) -> Option<u32> {
    let suffix = number.strip_prefix(prefix)?.strip_prefix('-')?;
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Highest sequence among `existing` numbers that belong to `prefix`
pub fn max_sequence<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    existing
        .into_iter()
        .filter_map(|n| parse_sequence(n, prefix))
        .max()
}

/// Next document number given the numbers already issued for the prefix
pub fn next_document_number<'a>(
    kind: DocumentKind,
    date: NaiveDate,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let prefix = document_prefix(kind, date);
    let next = max_sequence(&prefix, existing).unwrap_or(0).saturating_add(1);
    format_document_number(&prefix, next)
}
