//! Spreadsheet import schemas
//!
//! An uploaded sheet is decoded into a [`RawTable`] of strings by the
//! backend. This module finds the header row, maps headers to columns
//! (English or Indonesian), and turns each data row into a typed record.
//! Any row error rejects the whole import; every error is reported.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation;

/// Spreadsheet contents as trimmed strings, row-major
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    fn is_blank(row: &[String]) -> bool {
        row.iter().all(|c| c.trim().is_empty())
    }

    /// Index of the header row: the first row with any content
    fn header_index(&self) -> Option<usize> {
        self.rows.iter().position(|r| !Self::is_blank(r))
    }

    /// Number of non-blank data rows below the header
    pub fn data_row_count(&self) -> usize {
        match self.header_index() {
            Some(h) => self.rows[h + 1..].iter().filter(|r| !Self::is_blank(r)).count(),
            None => 0,
        }
    }
}

/// What an import file contains
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Items,
    Suppliers,
    Customers,
    Warehouses,
    Inbound,
}

impl ImportKind {
    pub const ALL: [ImportKind; 5] = [
        ImportKind::Items,
        ImportKind::Suppliers,
        ImportKind::Customers,
        ImportKind::Warehouses,
        ImportKind::Inbound,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "items" => Some(ImportKind::Items),
            "suppliers" => Some(ImportKind::Suppliers),
            "customers" => Some(ImportKind::Customers),
            "warehouses" => Some(ImportKind::Warehouses),
            "inbound" => Some(ImportKind::Inbound),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Items => "items",
            ImportKind::Suppliers => "suppliers",
            ImportKind::Customers => "customers",
            ImportKind::Warehouses => "warehouses",
            ImportKind::Inbound => "inbound",
        }
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            ImportKind::Items => ITEM_COLUMNS,
            ImportKind::Suppliers | ImportKind::Customers => PARTNER_COLUMNS,
            ImportKind::Warehouses => WAREHOUSE_COLUMNS,
            ImportKind::Inbound => INBOUND_COLUMNS,
        }
    }

    /// Header row written into the downloadable template
    pub fn template_headers(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.header).collect()
    }
}

/// One importable column
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub header: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

const ITEM_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { key: "code", header: "Item Code", aliases: &["code", "item code", "kode", "kode barang"], required: true },
    ColumnSpec { key: "name", header: "Item Name", aliases: &["name", "item name", "nama", "nama barang"], required: true },
    ColumnSpec { key: "category", header: "Category", aliases: &["category", "kategori"], required: false },
    ColumnSpec { key: "unit", header: "Unit", aliases: &["unit", "satuan"], required: false },
    ColumnSpec { key: "description", header: "Description", aliases: &["description", "deskripsi", "keterangan"], required: false },
    ColumnSpec { key: "min_stock", header: "Min Stock", aliases: &["min stock", "minimum stock", "stok minimum"], required: false },
];

const PARTNER_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { key: "name", header: "Name", aliases: &["name", "nama"], required: true },
    ColumnSpec { key: "contact_person", header: "Contact Person", aliases: &["contact person", "kontak", "nama kontak"], required: false },
    ColumnSpec { key: "phone", header: "Phone", aliases: &["phone", "telepon", "no telepon", "no hp"], required: false },
    ColumnSpec { key: "email", header: "Email", aliases: &["email", "e-mail"], required: false },
    ColumnSpec { key: "address", header: "Address", aliases: &["address", "alamat"], required: false },
    ColumnSpec { key: "notes", header: "Notes", aliases: &["notes", "catatan"], required: false },
];

const WAREHOUSE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { key: "code", header: "Warehouse Code", aliases: &["code", "warehouse code", "kode", "kode gudang"], required: true },
    ColumnSpec { key: "name", header: "Warehouse Name", aliases: &["name", "warehouse name", "nama", "nama gudang"], required: true },
    ColumnSpec { key: "address", header: "Address", aliases: &["address", "alamat"], required: false },
    ColumnSpec { key: "description", header: "Description", aliases: &["description", "deskripsi", "keterangan"], required: false },
];

const INBOUND_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { key: "reference", header: "Reference", aliases: &["reference", "referensi", "no referensi", "no surat jalan"], required: true },
    ColumnSpec { key: "date", header: "Date", aliases: &["date", "tanggal"], required: true },
    ColumnSpec { key: "warehouse", header: "Warehouse", aliases: &["warehouse", "gudang"], required: true },
    ColumnSpec { key: "supplier", header: "Supplier", aliases: &["supplier", "pemasok"], required: false },
    ColumnSpec { key: "item_code", header: "Item Code", aliases: &["item code", "kode barang"], required: true },
    ColumnSpec { key: "quantity", header: "Quantity", aliases: &["quantity", "qty", "jumlah"], required: true },
    ColumnSpec { key: "unit_price", header: "Unit Price", aliases: &["unit price", "harga", "harga satuan"], required: false },
];

/// A problem with one cell or row of an import file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowError {
    /// 1-based row number as shown in a spreadsheet application
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            row,
            column: column.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "row {} ({}): {}", self.row, col, self.message),
            None => write!(f, "row {}: {}", self.row, self.message),
        }
    }
}

/// Item master row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRow {
    pub row: usize,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_stock: i32,
}

/// Supplier or customer row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartnerRow {
    pub row: usize,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Warehouse master row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarehouseRow {
    pub row: usize,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// One line of an inbound document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundRow {
    pub row: usize,
    pub reference: String,
    pub date: NaiveDate,
    pub warehouse: String,
    pub supplier: Option<String>,
    pub item_code: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

/// Inbound rows that become one inbound document
#[derive(Debug, Clone, PartialEq)]
pub struct InboundGroup {
    pub reference: String,
    pub date: NaiveDate,
    pub warehouse: String,
    pub supplier: Option<String>,
    pub rows: Vec<InboundRow>,
}

fn normalize_header(h: &str) -> String {
    h.trim()
        .to_lowercase()
        .replace(['_', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Header-to-column resolution for one table
struct ColumnMap {
    kind: ImportKind,
    indices: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn resolve(kind: ImportKind, header: &[String], header_row: usize) -> Result<Self, Vec<RowError>> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
        let mut indices = HashMap::new();
        let mut errors = Vec::new();

        for spec in kind.columns() {
            let found = normalized
                .iter()
                .position(|h| spec.aliases.iter().any(|a| normalize_header(a) == *h));
            match found {
                Some(idx) => {
                    indices.insert(spec.key, idx);
                }
                None if spec.required => errors.push(RowError::new(
                    header_row,
                    Some(spec.header),
                    "Required column is missing",
                )),
                None => {}
            }
        }

        if errors.is_empty() {
            Ok(Self { kind, indices })
        } else {
            Err(errors)
        }
    }

    fn header(&self, key: &str) -> &'static str {
        self.kind
            .columns()
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.header)
            .unwrap_or("")
    }

    fn get<'r>(&self, row: &'r [String], key: &str) -> Option<&'r str> {
        let idx = *self.indices.get(key)?;
        row.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Cursor over a single data row that collects errors
struct RowReader<'a> {
    map: &'a ColumnMap,
    cells: &'a [String],
    row: usize,
    errors: Vec<RowError>,
}

impl<'a> RowReader<'a> {
    fn optional(&self, key: &str) -> Option<String> {
        self.map.get(self.cells, key).map(str::to_string)
    }

    fn required(&mut self, key: &str) -> String {
        match self.map.get(self.cells, key) {
            Some(v) => v.to_string(),
            None => {
                self.fail(key, "Value is required");
                String::new()
            }
        }
    }

    fn fail(&mut self, key: &str, message: &str) {
        let header = self.map.header(key);
        self.errors.push(RowError::new(self.row, Some(header), message));
    }

    fn check(&mut self, key: &str, result: Result<(), &'static str>) {
        if let Err(msg) = result {
            self.fail(key, msg);
        }
    }

    fn integer(&mut self, key: &str) -> Option<i32> {
        let raw = self.map.get(self.cells, key)?;
        match parse_integer(raw) {
            Some(v) => Some(v),
            None => {
                self.fail(key, "Must be a whole number");
                None
            }
        }
    }

    fn decimal(&mut self, key: &str) -> Option<Decimal> {
        let raw = self.map.get(self.cells, key)?;
        match parse_decimal(raw) {
            Some(v) => Some(v),
            None if is_ambiguous_grouping(raw) => {
                self.fail(key, "Ambiguous number: write 12500 or 12.5, not 12.500");
                None
            }
            None => {
                self.fail(key, "Must be a number");
                None
            }
        }
    }

    fn date(&mut self, key: &str) -> Option<NaiveDate> {
        let raw = self.map.get(self.cells, key)?;
        match parse_date(raw) {
            Some(v) => Some(v),
            None => {
                self.fail(key, "Must be a date (YYYY-MM-DD or DD/MM/YYYY)");
                None
            }
        }
    }
}

/// Parse a whole number, tolerating a trailing `.0` from spreadsheet cells
pub fn parse_integer(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    raw.parse().ok()
}

/// Parse a decimal; a lone comma is treated as the decimal separator
///
/// A single separator followed by exactly three digits (`12.500`, `12,500`)
/// is rejected, since it reads as a thousands group just as well.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if is_ambiguous_grouping(raw) {
        return None;
    }
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.replace(',', "")
    };
    normalized.parse().ok()
}

/// `d.ddd` or `d,ddd` with no other separator and a non-zero integer part
pub fn is_ambiguous_grouping(raw: &str) -> bool {
    let raw = raw.trim();
    let raw = raw.strip_prefix('-').unwrap_or(raw);
    let separators: Vec<usize> = raw.match_indices(['.', ',']).map(|(i, _)| i).collect();
    let [at] = separators.as_slice() else {
        return false;
    };
    let (int, frac) = (&raw[..*at], &raw[*at + 1..]);
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    digits(int) && !int.starts_with('0') && frac.len() == 3 && digits(frac)
}

/// Parse `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY`
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.split_whitespace().next().unwrap_or(raw);
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Run `parse_row` over every non-blank data row of `table`
fn parse_rows<T>(
    kind: ImportKind,
    table: &RawTable,
    mut parse_row: impl FnMut(&mut RowReader<'_>) -> T,
) -> Result<Vec<T>, Vec<RowError>> {
    let header_idx = table
        .header_index()
        .ok_or_else(|| vec![RowError::new(1, None, "The file is empty")])?;
    let map = ColumnMap::resolve(kind, &table.rows[header_idx], header_idx + 1)?;

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (idx, cells) in table.rows.iter().enumerate().skip(header_idx + 1) {
        if RawTable::is_blank(cells) {
            continue;
        }
        let mut reader = RowReader {
            map: &map,
            cells,
            row: idx + 1,
            errors: Vec::new(),
        };
        let record = parse_row(&mut reader);
        if reader.errors.is_empty() {
            records.push(record);
        } else {
            errors.append(&mut reader.errors);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if records.is_empty() {
        return Err(vec![RowError::new(header_idx + 1, None, "The file has no data rows")]);
    }
    Ok(records)
}

pub fn parse_items(table: &RawTable) -> Result<Vec<ItemRow>, Vec<RowError>> {
    let rows = parse_rows(ImportKind::Items, table, |r| {
        let code = r.required("code");
        if !code.is_empty() {
            r.check("code", validation::validate_code(&code));
        }
        let name = r.required("name");
        let min_stock = r.integer("min_stock").unwrap_or(0);
        r.check("min_stock", validation::validate_min_stock(min_stock));
        ItemRow {
            row: r.row,
            code,
            name,
            category: r.optional("category"),
            unit: r.optional("unit"),
            description: r.optional("description"),
            min_stock,
        }
    })?;
    reject_duplicates(&rows, |r| (r.row, r.code.to_lowercase()), "Item Code")?;
    Ok(rows)
}

pub fn parse_partners(kind: ImportKind, table: &RawTable) -> Result<Vec<PartnerRow>, Vec<RowError>> {
    let rows = parse_rows(kind, table, |r| {
        let name = r.required("name");
        let phone = r.optional("phone");
        if let Some(p) = &phone {
            r.check("phone", validation::validate_indonesian_phone(p));
        }
        let email = r.optional("email");
        if let Some(e) = &email {
            r.check("email", validation::validate_email(e));
        }
        PartnerRow {
            row: r.row,
            name,
            contact_person: r.optional("contact_person"),
            phone,
            email,
            address: r.optional("address"),
            notes: r.optional("notes"),
        }
    })?;
    reject_duplicates(&rows, |r| (r.row, r.name.to_lowercase()), "Name")?;
    Ok(rows)
}

pub fn parse_warehouses(table: &RawTable) -> Result<Vec<WarehouseRow>, Vec<RowError>> {
    let rows = parse_rows(ImportKind::Warehouses, table, |r| {
        let code = r.required("code");
        if !code.is_empty() {
            r.check("code", validation::validate_code(&code));
        }
        WarehouseRow {
            row: r.row,
            code,
            name: r.required("name"),
            address: r.optional("address"),
            description: r.optional("description"),
        }
    })?;
    reject_duplicates(&rows, |r| (r.row, r.code.to_lowercase()), "Warehouse Code")?;
    Ok(rows)
}

pub fn parse_inbound(table: &RawTable) -> Result<Vec<InboundRow>, Vec<RowError>> {
    parse_rows(ImportKind::Inbound, table, |r| {
        let reference = r.required("reference");
        let date = r.date("date");
        if date.is_none() && r.optional("date").is_none() {
            r.fail("date", "Value is required");
        }
        let warehouse = r.required("warehouse");
        let item_code = r.required("item_code");
        let quantity = r.integer("quantity");
        match quantity {
            Some(q) if q <= 0 => r.fail("quantity", "Quantity must be positive"),
            None if r.optional("quantity").is_none() => r.fail("quantity", "Value is required"),
            _ => {}
        }
        let unit_price = r.decimal("unit_price");
        if unit_price.is_some_and(|p| p.is_sign_negative()) {
            r.fail("unit_price", "Unit price cannot be negative");
        }
        InboundRow {
            row: r.row,
            reference,
            date: date.unwrap_or_default(),
            warehouse,
            supplier: r.optional("supplier"),
            item_code,
            quantity: quantity.unwrap_or_default(),
            unit_price,
        }
    })
}

/// Group inbound rows into documents, keeping first-seen order
pub fn group_inbound(rows: Vec<InboundRow>) -> Vec<InboundGroup> {
    let mut groups: Vec<InboundGroup> = Vec::new();
    let mut index: HashMap<(String, NaiveDate, String, Option<String>), usize> = HashMap::new();

    for row in rows {
        let key = (
            row.reference.clone(),
            row.date,
            row.warehouse.to_lowercase(),
            row.supplier.as_ref().map(|s| s.to_lowercase()),
        );
        match index.get(&key) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(InboundGroup {
                    reference: row.reference.clone(),
                    date: row.date,
                    warehouse: row.warehouse.clone(),
                    supplier: row.supplier.clone(),
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// Reject rows whose key repeats an earlier row in the same file
fn reject_duplicates<T>(
    rows: &[T],
    key: impl Fn(&T) -> (usize, String),
    column: &str,
) -> Result<(), Vec<RowError>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut errors = Vec::new();
    for r in rows {
        let (row, k) = key(r);
        if let Some(first) = seen.get(&k) {
            errors.push(RowError::new(
                row,
                Some(column),
                format!("Duplicate of row {}", first),
            ));
        } else {
            seen.insert(k, row);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_indonesian_headers_are_recognized() {
        let t = table(&[
            &["Kode Barang", "Nama Barang", "Satuan", "Stok Minimum"],
            &["BRG-001", "Baut M8", "pcs", "10"],
        ]);
        let rows = parse_items(&t).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "BRG-001");
        assert_eq!(rows[0].unit.as_deref(), Some("pcs"));
        assert_eq!(rows[0].min_stock, 10);
        assert_eq!(rows[0].row, 2);
    }

    #[test]
    fn test_leading_blank_rows_and_blank_data_rows_skipped() {
        let t = table(&[
            &["", ""],
            &["item_code", "ITEM NAME"],
            &["A1", "Alpha"],
            &["", ""],
            &["B2", "Beta"],
        ]);
        let rows = parse_items(&t).unwrap();
        assert_eq!(rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(t.data_row_count(), 2);
    }

    #[test]
    fn test_missing_required_column() {
        let t = table(&[&["Item Name"], &["Alpha"]]);
        let errors = parse_items(&t).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column.as_deref(), Some("Item Code"));
    }

    #[test]
    fn test_all_row_errors_reported() {
        let t = table(&[
            &["Item Code", "Item Name", "Min Stock"],
            &["A 1", "Alpha", "x"],
            &["B2", "", "-1"],
        ]);
        let errors = parse_items(&t).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.row == 2 && e.column.as_deref() == Some("Item Code")));
        assert!(errors.iter().any(|e| e.row == 3 && e.column.as_deref() == Some("Item Name")));
    }

    #[test]
    fn test_duplicate_codes_in_file() {
        let t = table(&[&["Item Code", "Item Name"], &["A1", "Alpha"], &["a1", "Again"]]);
        let errors = parse_items(&t).unwrap_err();
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].message, "Duplicate of row 2");
    }

    #[test]
    fn test_empty_file() {
        assert!(parse_items(&RawTable::default()).is_err());
        let header_only = table(&[&["Item Code", "Item Name"]]);
        assert!(parse_items(&header_only).is_err());
    }

    #[test]
    fn test_partner_contact_validation() {
        let t = table(&[
            &["Nama", "Telepon", "Email"],
            &["PT Sumber Makmur", "0812-3456-7890", "sales@sumber.co.id"],
            &["CV Salah", "12", "bukan-email"],
        ]);
        let errors = parse_partners(ImportKind::Suppliers, &t).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.row == 3));
    }

    #[test]
    fn test_inbound_rows_grouped_by_document() {
        let t = table(&[
            &["Reference", "Tanggal", "Gudang", "Pemasok", "Kode Barang", "Qty", "Harga"],
            &["SJ-01", "2025-06-02", "Gudang Utama", "PT A", "A1", "5", "1500,50"],
            &["SJ-01", "02/06/2025", "gudang utama", "pt a", "B2", "3", ""],
            &["SJ-02", "2025-06-03", "Gudang Utama", "", "A1", "1", ""],
        ]);
        let rows = parse_inbound(&t).unwrap();
        assert_eq!(rows[0].unit_price, Some(Decimal::new(150050, 2)));
        let groups = group_inbound(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[1].supplier, None);
    }

    #[test]
    fn test_inbound_rejects_bad_quantity_and_date() {
        let t = table(&[
            &["Reference", "Date", "Warehouse", "Item Code", "Quantity"],
            &["SJ-01", "kemarin", "WH", "A1", "0"],
        ]);
        let errors = parse_inbound(&t).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_integer("12.0"), Some(12));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_decimal("1,234.5"), Some(Decimal::new(12345, 1)));
        assert_eq!(parse_decimal("12.500"), None);
        assert_eq!(parse_decimal("12,500"), None);
        assert_eq!(parse_decimal("0.125"), Some(Decimal::new(125, 3)));
        assert_eq!(parse_decimal("12.5000"), Some(Decimal::new(125000, 4)));
        assert_eq!(parse_date("15/06/2025"), NaiveDate::from_ymd_opt(2025, 6, 15));
        assert_eq!(parse_date("2025-06-15 00:00:00"), NaiveDate::from_ymd_opt(2025, 6, 15));
    }

    #[test]
    fn test_template_headers_match_columns() {
        for kind in ImportKind::ALL {
            let headers = kind.template_headers();
            let t = RawTable::new(vec![headers.iter().map(|h| h.to_string()).collect()]);
            // A header-only template resolves every column and only lacks data
            let errors = match kind {
                ImportKind::Items => parse_items(&t).unwrap_err(),
                ImportKind::Suppliers | ImportKind::Customers => parse_partners(kind, &t).unwrap_err(),
                ImportKind::Warehouses => parse_warehouses(&t).unwrap_err(),
                ImportKind::Inbound => parse_inbound(&t).unwrap_err(),
            };
            assert_eq!(errors[0].message, "The file has no data rows");
        }
    }
}
