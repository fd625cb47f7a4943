//! Document numbering tests
//!
//! `{CODE}-{MM}{YY}-{NNNN}`: per-prefix sequences, gaps and foreign
//! numbers ignored, growth past four digits.

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::models::DocumentKind;
use shared::numbering::{
    document_prefix, format_document_number, max_sequence, next_document_number, parse_sequence,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_prefixes_per_kind() {
        let d = date(2025, 6, 15);
        let prefixes: Vec<String> = DocumentKind::ALL
            .iter()
            .map(|k| document_prefix(*k, d))
            .collect();
        assert_eq!(prefixes, ["SM-0625", "SK-0625", "TG-0625", "SO-0625"]);
    }

    #[test]
    fn test_first_number_of_month() {
        let none: [&str; 0] = [];
        assert_eq!(
            next_document_number(DocumentKind::Inbound, date(2025, 1, 3), none),
            "SM-0125-0001"
        );
    }

    #[test]
    fn test_next_after_gap() {
        let existing = ["SK-0725-0001", "SK-0725-0007", "SK-0725-0003"];
        assert_eq!(
            next_document_number(DocumentKind::Outbound, date(2025, 7, 31), existing),
            "SK-0725-0008"
        );
    }

    #[test]
    fn test_other_months_and_garbage_ignored() {
        let existing = ["TG-0625-0009", "TG-0725-ABCD", "TG-0725-", "SM-0725-0004"];
        assert_eq!(
            next_document_number(DocumentKind::Transfer, date(2025, 7, 1), existing),
            "TG-0725-0001"
        );
    }

    #[test]
    fn test_sequence_grows_past_four_digits() {
        assert_eq!(format_document_number("SO-1225", 9999), "SO-1225-9999");
        let existing = ["SO-1225-9999"];
        assert_eq!(
            next_document_number(DocumentKind::StockCount, date(2025, 12, 1), existing),
            "SO-1225-10000"
        );
        assert_eq!(parse_sequence("SO-1225-10000", "SO-1225"), Some(10000));
    }

    #[test]
    fn test_year_uses_two_digits() {
        assert_eq!(document_prefix(DocumentKind::Inbound, date(2030, 2, 1)), "SM-0230");
        assert_eq!(document_prefix(DocumentKind::Inbound, date(2100, 11, 1)), "SM-1100");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn kind_strategy() -> impl Strategy<Value = DocumentKind> {
        prop_oneof![
            Just(DocumentKind::Inbound),
            Just(DocumentKind::Outbound),
            Just(DocumentKind::Transfer),
            Just(DocumentKind::StockCount),
        ]
    }

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2099, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A formatted number parses back to its sequence
        #[test]
        fn prop_format_parse(kind in kind_strategy(), d in date_strategy(), seq in 1u32..200_000) {
            let prefix = document_prefix(kind, d);
            let number = format_document_number(&prefix, seq);
            prop_assert_eq!(parse_sequence(&number, &prefix), Some(seq));
            prop_assert!(number.len() >= prefix.len() + 5);
        }

        /// Issuing numbers one after another yields 1, 2, 3, ... without repeats
        #[test]
        fn prop_sequential_allocation(kind in kind_strategy(), d in date_strategy(), count in 1usize..60) {
            let mut issued: Vec<String> = Vec::new();
            for _ in 0..count {
                let next = next_document_number(kind, d, issued.iter().map(String::as_str));
                prop_assert!(!issued.contains(&next));
                issued.push(next);
            }
            let prefix = document_prefix(kind, d);
            prop_assert_eq!(max_sequence(&prefix, issued.iter().map(String::as_str)), Some(count as u32));
        }

        /// The next number is always above every existing one
        #[test]
        fn prop_next_exceeds_existing(seqs in prop::collection::vec(1u32..50_000, 0..20)) {
            let d = date(2025, 6, 1);
            let prefix = document_prefix(DocumentKind::Inbound, d);
            let existing: Vec<String> = seqs.iter().map(|s| format_document_number(&prefix, *s)).collect();

            let next = next_document_number(DocumentKind::Inbound, d, existing.iter().map(String::as_str));
            let next_seq = parse_sequence(&next, &prefix).unwrap();
            prop_assert_eq!(next_seq, seqs.iter().max().copied().unwrap_or(0) + 1);
        }
    }
}
