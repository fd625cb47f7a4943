//! Spreadsheet import parsing tests
//!
//! Header aliases (English and Indonesian), row validation with spreadsheet
//! row numbers, and grouping of inbound rows into documents.

use proptest::prelude::*;
use shared::import::{
    group_inbound, parse_date, parse_decimal, parse_inbound, parse_integer, parse_items,
    parse_partners, parse_warehouses, ImportKind, RawTable,
};

fn table(rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_items_with_indonesian_headers() {
        let t = table(&[
            &["Kode Barang", "Nama Barang", "Satuan", "Stok Minimum"],
            &["BRG-001", "Baut M8", "pcs", "10"],
            &["", "", "", ""],
            &["BRG-002", "Mur M8", "", ""],
        ]);

        let rows = parse_items(&t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].min_stock, 10);
        assert_eq!(rows[1].row, 4);
        assert_eq!(rows[1].unit, None);
        assert_eq!(rows[1].min_stock, 0);
    }

    #[test]
    fn test_header_row_may_follow_blank_rows() {
        let t = table(&[
            &["", ""],
            &["warehouse_code", "WAREHOUSE NAME"],
            &["GD-01", "Gudang Utama"],
        ]);
        let rows = parse_warehouses(&t).unwrap();
        assert_eq!(rows[0].code, "GD-01");
        assert_eq!(rows[0].row, 3);
    }

    #[test]
    fn test_missing_required_column() {
        let t = table(&[&["Nama Barang"], &["Baut"]]);
        let errors = parse_items(&t).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 1);
        assert_eq!(errors[0].column.as_deref(), Some("Item Code"));
    }

    #[test]
    fn test_all_row_errors_reported() {
        let t = table(&[
            &["Name", "Phone", "Email"],
            &["PT Sumber Makmur", "0812-3456-7890", "sales@sumber.co.id"],
            &["CV Maju", "12ab", ""],
            &["", "", "bukan-email"],
        ]);
        let errors = parse_partners(ImportKind::Suppliers, &t).unwrap_err();
        let rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 4, 4]);
    }

    #[test]
    fn test_duplicate_codes_in_file() {
        let t = table(&[
            &["Code", "Name"],
            &["A-1", "Alpha"],
            &["a-1", "Alpha lagi"],
        ]);
        let errors = parse_items(&t).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
    }

    #[test]
    fn test_empty_file() {
        assert!(parse_items(&RawTable::default()).is_err());
        assert!(parse_items(&table(&[&["Code", "Name"]])).is_err());
    }

    #[test]
    fn test_inbound_rows_grouped_into_documents() {
        let t = table(&[
            &["No Surat Jalan", "Tanggal", "Gudang", "Pemasok", "Kode Barang", "Jumlah", "Harga Satuan"],
            &["SJ-01", "01/06/2025", "Gudang Utama", "PT Sumber", "BRG-001", "10", "1500"],
            &["SJ-01", "2025-06-01", "gudang utama", "pt sumber", "BRG-002", "5", ""],
            &["SJ-02", "2025-06-02", "Gudang Utama", "", "BRG-001", "3", ""],
        ]);

        let rows = parse_inbound(&t).unwrap();
        assert_eq!(rows[0].unit_price, Some(Decimal::from(1500)));
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        let groups = group_inbound(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[1].reference, "SJ-02");
        assert_eq!(groups[1].supplier, None);
    }

    #[test]
    fn test_inbound_rejects_bad_quantity_and_date() {
        let t = table(&[
            &["Reference", "Date", "Warehouse", "Item Code", "Quantity"],
            &["SJ-01", "kemarin", "GD-01", "BRG-001", "0"],
        ]);
        let errors = parse_inbound(&t).unwrap_err();
        let columns: Vec<&str> = errors.iter().filter_map(|e| e.column.as_deref()).collect();
        assert!(columns.contains(&"Date"));
        assert!(columns.contains(&"Quantity"));
    }

    #[test]
    fn test_inbound_rejects_thousands_style_price() {
        let t = table(&[
            &["Reference", "Date", "Warehouse", "Item Code", "Quantity", "Unit Price"],
            &["SJ-01", "2025-06-01", "GD-01", "BRG-001", "4", "12.500"],
            &["SJ-01", "2025-06-01", "GD-01", "BRG-002", "4", "12500"],
        ]);
        let errors = parse_inbound(&t).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
        assert_eq!(errors[0].column.as_deref(), Some("Unit Price"));
        assert!(errors[0].message.starts_with("Ambiguous number"));
    }

    #[test]
    fn test_cell_parsers() {
        assert_eq!(parse_integer("12.0"), Some(12));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_decimal("12,5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("1,500.25"), Some(Decimal::new(150025, 2)));
        assert_eq!(parse_decimal("12,500"), None);
        assert_eq!(parse_decimal("-7.250"), None);
        assert_eq!(parse_decimal("1500"), Some(Decimal::from(1500)));
        assert_eq!(parse_date("31-12-2024"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_date("2024-12-31 00:00:00"), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_template_headers_parse_back() {
        for kind in ImportKind::ALL {
            assert_eq!(ImportKind::parse(kind.as_str()), Some(kind));
            assert!(!kind.template_headers().is_empty());
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Blank rows never count as data and never shift row numbers
        #[test]
        fn prop_blank_rows_ignored(blanks in prop::collection::vec(any::<bool>(), 1..30)) {
            let mut rows: Vec<Vec<String>> = vec![vec!["Code".into(), "Name".into()]];
            let mut expected = Vec::new();
            for (i, blank) in blanks.iter().enumerate() {
                if *blank {
                    rows.push(vec![String::new(), "  ".into()]);
                } else {
                    rows.push(vec![format!("ITM-{}", i), format!("Item {}", i)]);
                    expected.push(rows.len());
                }
            }
            let t = RawTable::new(rows);
            prop_assert_eq!(t.data_row_count(), expected.len());

            match parse_items(&t) {
                Ok(items) => {
                    let numbers: Vec<usize> = items.iter().map(|r| r.row).collect();
                    prop_assert_eq!(numbers, expected);
                }
                Err(_) => prop_assert!(expected.is_empty()),
            }
        }

        /// One separator before exactly three digits is never guessed at
        #[test]
        fn prop_thousands_groups_rejected(whole in 1u32..100_000, group in 0u32..1000, comma in any::<bool>()) {
            let sep = if comma { ',' } else { '.' };
            prop_assert_eq!(parse_decimal(&format!("{}{}{:03}", whole, sep, group)), None);
        }

        /// Whole numbers survive a trip through spreadsheet-style text
        #[test]
        fn prop_integer_cells(n in -100_000i32..100_000) {
            prop_assert_eq!(parse_integer(&n.to_string()), Some(n));
            prop_assert_eq!(parse_integer(&format!("{}.0", n)), Some(n));
        }
    }
}
