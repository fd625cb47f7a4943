//! Validation and pagination tests

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{CountLineInput, MovementLineInput};
use shared::types::{DateRange, Pagination, MAX_PER_PAGE};
use shared::validation::*;
use uuid::Uuid;

fn count_line(item_id: Uuid, counted_quantity: i32) -> CountLineInput {
    CountLineInput {
        item_id,
        counted_quantity,
        notes: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_movement_lines() {
        let item = Uuid::new_v4();
        assert!(validate_movement_lines(&[]).is_err());
        assert!(validate_movement_lines(&[MovementLineInput::new(item, 0)]).is_err());
        assert!(validate_movement_lines(&[MovementLineInput::new(item, -3)]).is_err());
        assert!(validate_movement_lines(&[MovementLineInput::new(item, 1)]).is_ok());

        let mut priced = MovementLineInput::new(item, 2);
        priced.unit_price = Some(Decimal::new(-1, 0));
        assert!(validate_movement_lines(&[priced]).is_err());
    }

    #[test]
    fn test_too_many_lines() {
        let lines: Vec<MovementLineInput> = (0..=MAX_DOCUMENT_LINES)
            .map(|_| MovementLineInput::new(Uuid::new_v4(), 1))
            .collect();
        assert!(validate_movement_lines(&lines).is_err());
    }

    #[test]
    fn test_count_lines() {
        let item = Uuid::new_v4();
        assert!(validate_count_lines(&[]).is_err());
        assert!(validate_count_lines(&[count_line(item, 0)]).is_ok());
        assert!(validate_count_lines(&[count_line(item, -1)]).is_err());
        assert!(validate_count_lines(&[count_line(item, 1), count_line(item, 2)]).is_err());
    }

    #[test]
    fn test_transfer_warehouses_must_differ() {
        let gudang = Uuid::new_v4();
        assert!(validate_transfer_warehouses(gudang, gudang).is_err());
        assert!(validate_transfer_warehouses(gudang, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_indonesian_phone() {
        for ok in ["081234567890", "0812-3456-7890", "+6281234567890", "(021) 5551234"] {
            assert!(validate_indonesian_phone(ok).is_ok(), "{}", ok);
        }
        for bad in ["12345", "0812abc", "+1 555 123 4567"] {
            assert!(validate_indonesian_phone(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_credentials() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("Admin").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_password("rahasia1").is_ok());
        assert!(validate_password("pendek").is_err());
    }

    #[test]
    fn test_codes_and_names() {
        assert!(validate_code("BRG-001").is_ok());
        assert!(validate_code("BRG 001").is_err());
        assert!(validate_code("").is_err());
        assert!(validate_name("  ").is_err());
        assert!(validate_min_stock(-1).is_err());
    }

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::from_query(None, None);
        assert_eq!((p.page, p.per_page), (1, 20));
        assert_eq!(p.offset(), 0);

        let p = Pagination::from_query(Some(0), Some(1000));
        assert_eq!((p.page, p.per_page), (1, MAX_PER_PAGE));
    }

    #[test]
    fn test_date_range() {
        let jun = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let jul = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let range = DateRange::new(Some(jun), Some(jul)).unwrap();
        assert!(range.contains(jun));
        assert!(range.contains(jul));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 7, 2).unwrap()));
        assert!(DateRange::new(Some(jul), Some(jun)).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Page and page size always land in their allowed ranges
        #[test]
        fn prop_pagination_clamped(page in any::<Option<u32>>(), per_page in any::<Option<u32>>()) {
            let p = Pagination::from_query(page, per_page);
            prop_assert!(p.page >= 1);
            prop_assert!((1..=MAX_PER_PAGE).contains(&p.per_page));
            prop_assert!(p.offset() >= 0);
            prop_assert_eq!(p.limit(), i64::from(p.per_page));
        }

        /// Any positive quantities are accepted; one non-positive line rejects all
        #[test]
        fn prop_movement_quantities(
            quantities in prop::collection::vec(1i32..10_000, 1..20),
            bad in -10_000i32..=0,
            at in any::<prop::sample::Index>()
        ) {
            let mut lines: Vec<MovementLineInput> = quantities
                .iter()
                .map(|q| MovementLineInput::new(Uuid::new_v4(), *q))
                .collect();
            prop_assert!(validate_movement_lines(&lines).is_ok());

            let i = at.index(lines.len());
            lines[i].quantity = bad;
            prop_assert!(validate_movement_lines(&lines).is_err());
        }

        /// Domestic mobile numbers validate with or without separators
        #[test]
        fn prop_mobile_numbers(rest in "[0-9]{8,10}") {
            let plain = format!("08{}", rest);
            prop_assert!(validate_indonesian_phone(&plain).is_ok());
            let international = format!("+628{}", rest);
            prop_assert!(validate_indonesian_phone(&international).is_ok());
        }
    }
}
