//! Report exports: query, flatten to a [`Table`], then encode as CSV or XLSX
//!
//! Movement reports are flattened to one row per document line with the
//! header fields repeated.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::table::Table;
use shared::types::DateRange;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::partner::Partner;
use crate::services::spreadsheet::ExportFormat;
use crate::services::warehouse::Warehouse;
use crate::services::PartnerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportReport {
    Items,
    Suppliers,
    Customers,
    Warehouses,
    Stock,
    Inbound,
    Outbound,
    Transfers,
    StockCounts,
}

impl ExportReport {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "items" => Some(ExportReport::Items),
            "suppliers" => Some(ExportReport::Suppliers),
            "customers" => Some(ExportReport::Customers),
            "warehouses" => Some(ExportReport::Warehouses),
            "stock" => Some(ExportReport::Stock),
            "inbound" => Some(ExportReport::Inbound),
            "outbound" => Some(ExportReport::Outbound),
            "transfers" => Some(ExportReport::Transfers),
            "stock-counts" => Some(ExportReport::StockCounts),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ExportReport::Items => "items",
            ExportReport::Suppliers => "suppliers",
            ExportReport::Customers => "customers",
            ExportReport::Warehouses => "warehouses",
            ExportReport::Stock => "stock",
            ExportReport::Inbound => "inbound",
            ExportReport::Outbound => "outbound",
            ExportReport::Transfers => "transfers",
            ExportReport::StockCounts => "stock-counts",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ExportReport::Items => "Items",
            ExportReport::Suppliers => "Suppliers",
            ExportReport::Customers => "Customers",
            ExportReport::Warehouses => "Warehouses",
            ExportReport::Stock => "Stock",
            ExportReport::Inbound => "Inbound",
            ExportReport::Outbound => "Outbound",
            ExportReport::Transfers => "Transfers",
            ExportReport::StockCounts => "Stock Counts",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub warehouse_id: Option<Uuid>,
}

/// An encoded report ready to send as an attachment
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `<report>-<yyyymmdd>.<ext>`
pub fn export_file_name(report: ExportReport, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}-{}.{}", report.slug(), date.format("%Y%m%d"), format.extension())
}

#[derive(Clone)]
pub struct ExportService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ItemExportRow {
    code: String,
    name: String,
    category: Option<String>,
    unit: String,
    description: Option<String>,
    min_stock: i32,
    total_stock: i64,
}

#[derive(Debug, FromRow)]
struct StockExportRow {
    item_code: String,
    item_name: String,
    unit: String,
    warehouse_code: String,
    warehouse_name: String,
    shelf_code: Option<String>,
    quantity: i32,
    min_stock: i32,
}

/// One inbound or outbound line with its header
#[derive(Debug, FromRow)]
struct MovementExportRow {
    document_number: String,
    transaction_date: NaiveDate,
    warehouse_name: String,
    partner_name: Option<String>,
    reference: Option<String>,
    item_code: String,
    item_name: String,
    quantity: i32,
    unit: String,
    unit_price: Option<Decimal>,
    total_price: Option<Decimal>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct TransferExportRow {
    document_number: String,
    transaction_date: NaiveDate,
    source_warehouse_name: String,
    destination_warehouse_name: String,
    item_code: String,
    item_name: String,
    quantity: i32,
    unit: String,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct CountExportRow {
    document_number: String,
    count_date: NaiveDate,
    warehouse_name: String,
    item_code: String,
    item_name: String,
    system_quantity: i32,
    counted_quantity: i32,
    difference: i32,
    notes: Option<String>,
}

impl ExportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn export(&self, report: ExportReport, query: &ExportQuery) -> AppResult<ExportFile> {
        let format = ExportFormat::parse(query.format.as_deref())?;
        let range = DateRange::new(query.start_date, query.end_date)
            .map_err(|message| AppError::validation("start_date", message))?;

        let table = self.build_table(report, range, query.warehouse_id).await?;
        let bytes = format.encode(&table)?;

        tracing::info!(report = report.slug(), rows = table.len(), "Exported report");
        Ok(ExportFile {
            file_name: export_file_name(report, format, Utc::now().date_naive()),
            content_type: format.content_type(),
            bytes,
        })
    }

    pub async fn build_table(
        &self,
        report: ExportReport,
        range: DateRange,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Table> {
        let title = report.title();
        match report {
            ExportReport::Items => self.items_table(title).await,
            ExportReport::Suppliers => self.partners_table(title, PartnerKind::Supplier).await,
            ExportReport::Customers => self.partners_table(title, PartnerKind::Customer).await,
            ExportReport::Warehouses => self.warehouses_table(title).await,
            ExportReport::Stock => self.stock_table(title, warehouse_id).await,
            ExportReport::Inbound | ExportReport::Outbound => {
                self.movement_table(title, report == ExportReport::Inbound, range, warehouse_id)
                    .await
            }
            ExportReport::Transfers => self.transfers_table(title, range, warehouse_id).await,
            ExportReport::StockCounts => self.counts_table(title, range, warehouse_id).await,
        }
    }

    async fn items_table(&self, title: &str) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, ItemExportRow>(
            r#"
            SELECT i.code, i.name, i.category, i.unit, i.description, i.min_stock,
                   COALESCE(SUM(ws.quantity), 0)::bigint AS total_stock
            FROM items i
            LEFT JOIN warehouse_stocks ws ON ws.item_id = i.id
            GROUP BY i.id
            ORDER BY i.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &["Item Code", "Item Name", "Category", "Unit", "Description", "Min Stock", "Total Stock"],
        );
        for r in rows {
            table.push_row(vec![
                r.code.into(),
                r.name.into(),
                r.category.into(),
                r.unit.into(),
                r.description.into(),
                r.min_stock.into(),
                r.total_stock.into(),
            ]);
        }
        Ok(table)
    }

    async fn partners_table(&self, title: &str, kind: PartnerKind) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, Partner>(&format!(
            r#"
            SELECT id, name, contact_person, phone, email, address, notes, created_at, updated_at
            FROM {} ORDER BY name
            "#,
            kind.table()
        ))
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &["Name", "Contact Person", "Phone", "Email", "Address", "Notes"],
        );
        for r in rows {
            table.push_row(vec![
                r.name.into(),
                r.contact_person.into(),
                r.phone.into(),
                r.email.into(),
                r.address.into(),
                r.notes.into(),
            ]);
        }
        Ok(table)
    }

    async fn warehouses_table(&self, title: &str) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, Warehouse>(
            "SELECT id, code, name, address, description, created_at, updated_at FROM warehouses ORDER BY code",
        )
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(title, &["Warehouse Code", "Warehouse Name", "Address", "Description"]);
        for r in rows {
            table.push_row(vec![r.code.into(), r.name.into(), r.address.into(), r.description.into()]);
        }
        Ok(table)
    }

    async fn stock_table(&self, title: &str, warehouse_id: Option<Uuid>) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, StockExportRow>(
            r#"
            SELECT i.code AS item_code, i.name AS item_name, i.unit,
                   w.code AS warehouse_code, w.name AS warehouse_name,
                   s.code AS shelf_code, ws.quantity, i.min_stock
            FROM warehouse_stocks ws
            JOIN items i ON i.id = ws.item_id
            JOIN warehouses w ON w.id = ws.warehouse_id
            LEFT JOIN shelf_codes s ON s.id = ws.shelf_code_id
            WHERE ($1::uuid IS NULL OR ws.warehouse_id = $1)
            ORDER BY i.code, w.code
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &[
                "Item Code",
                "Item Name",
                "Unit",
                "Warehouse Code",
                "Warehouse Name",
                "Shelf Code",
                "Quantity",
                "Min Stock",
            ],
        );
        for r in rows {
            table.push_row(vec![
                r.item_code.into(),
                r.item_name.into(),
                r.unit.into(),
                r.warehouse_code.into(),
                r.warehouse_name.into(),
                r.shelf_code.into(),
                r.quantity.into(),
                r.min_stock.into(),
            ]);
        }
        Ok(table)
    }

    async fn movement_table(
        &self,
        title: &str,
        inbound: bool,
        range: DateRange,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Table> {
        let (header, lines, fk, partners, partner_fk, partner_label) = if inbound {
            ("inbound_transactions", "inbound_lines", "inbound_id", "suppliers", "supplier_id", "Supplier")
        } else {
            ("outbound_transactions", "outbound_lines", "outbound_id", "customers", "customer_id", "Customer")
        };

        let rows = sqlx::query_as::<_, MovementExportRow>(&format!(
            r#"
            SELECT t.document_number, t.transaction_date, w.name AS warehouse_name,
                   p.name AS partner_name, t.reference, i.code AS item_code, i.name AS item_name,
                   l.quantity, i.unit, l.unit_price, l.unit_price * l.quantity AS total_price, l.notes
            FROM {lines} l
            JOIN {header} t ON t.id = l.{fk}
            JOIN warehouses w ON w.id = t.warehouse_id
            JOIN items i ON i.id = l.item_id
            LEFT JOIN {partners} p ON p.id = t.{partner_fk}
            WHERE ($1::date IS NULL OR t.transaction_date >= $1)
              AND ($2::date IS NULL OR t.transaction_date <= $2)
              AND ($3::uuid IS NULL OR t.warehouse_id = $3)
            ORDER BY t.transaction_date, t.document_number, l.line_no
            "#,
            lines = lines,
            header = header,
            fk = fk,
            partners = partners,
            partner_fk = partner_fk,
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &[
                "Document Number",
                "Date",
                "Warehouse",
                partner_label,
                "Reference",
                "Item Code",
                "Item Name",
                "Quantity",
                "Unit",
                "Unit Price",
                "Total Price",
                "Notes",
            ],
        );
        for r in rows {
            table.push_row(vec![
                r.document_number.into(),
                r.transaction_date.into(),
                r.warehouse_name.into(),
                r.partner_name.into(),
                r.reference.into(),
                r.item_code.into(),
                r.item_name.into(),
                r.quantity.into(),
                r.unit.into(),
                r.unit_price.into(),
                r.total_price.into(),
                r.notes.into(),
            ]);
        }
        Ok(table)
    }

    async fn transfers_table(
        &self,
        title: &str,
        range: DateRange,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, TransferExportRow>(
            r#"
            SELECT t.document_number, t.transaction_date,
                   ws.name AS source_warehouse_name, wd.name AS destination_warehouse_name,
                   i.code AS item_code, i.name AS item_name, l.quantity, i.unit, l.notes
            FROM transfer_lines l
            JOIN transfers t ON t.id = l.transfer_id
            JOIN warehouses ws ON ws.id = t.source_warehouse_id
            JOIN warehouses wd ON wd.id = t.destination_warehouse_id
            JOIN items i ON i.id = l.item_id
            WHERE ($1::date IS NULL OR t.transaction_date >= $1)
              AND ($2::date IS NULL OR t.transaction_date <= $2)
              AND ($3::uuid IS NULL OR t.source_warehouse_id = $3 OR t.destination_warehouse_id = $3)
            ORDER BY t.transaction_date, t.document_number, l.line_no
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &[
                "Document Number",
                "Date",
                "Source Warehouse",
                "Destination Warehouse",
                "Item Code",
                "Item Name",
                "Quantity",
                "Unit",
                "Notes",
            ],
        );
        for r in rows {
            table.push_row(vec![
                r.document_number.into(),
                r.transaction_date.into(),
                r.source_warehouse_name.into(),
                r.destination_warehouse_name.into(),
                r.item_code.into(),
                r.item_name.into(),
                r.quantity.into(),
                r.unit.into(),
                r.notes.into(),
            ]);
        }
        Ok(table)
    }

    async fn counts_table(
        &self,
        title: &str,
        range: DateRange,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Table> {
        let rows = sqlx::query_as::<_, CountExportRow>(
            r#"
            SELECT c.document_number, c.count_date, w.name AS warehouse_name,
                   i.code AS item_code, i.name AS item_name,
                   l.system_quantity, l.counted_quantity, l.difference, l.notes
            FROM stock_count_lines l
            JOIN stock_counts c ON c.id = l.stock_count_id
            JOIN warehouses w ON w.id = c.warehouse_id
            JOIN items i ON i.id = l.item_id
            WHERE ($1::date IS NULL OR c.count_date >= $1)
              AND ($2::date IS NULL OR c.count_date <= $2)
              AND ($3::uuid IS NULL OR c.warehouse_id = $3)
            ORDER BY c.count_date, c.document_number, l.line_no
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut table = Table::new(
            title,
            &[
                "Document Number",
                "Date",
                "Warehouse",
                "Item Code",
                "Item Name",
                "System Quantity",
                "Counted Quantity",
                "Difference",
                "Notes",
            ],
        );
        for r in rows {
            table.push_row(vec![
                r.document_number.into(),
                r.count_date.into(),
                r.warehouse_name.into(),
                r.item_code.into(),
                r.item_name.into(),
                r.system_quantity.into(),
                r.counted_quantity.into(),
                r.difference.into(),
                r.notes.into(),
            ]);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_slugs_round_trip() {
        for slug in [
            "items", "suppliers", "customers", "warehouses", "stock", "inbound", "outbound",
            "transfers", "stock-counts",
        ] {
            assert_eq!(ExportReport::parse(slug).map(|r| r.slug()), Some(slug));
        }
        assert_eq!(ExportReport::parse("stock_counts"), None);
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(
            export_file_name(ExportReport::StockCounts, ExportFormat::Csv, date),
            "stock-counts-20250609.csv"
        );
        assert_eq!(
            export_file_name(ExportReport::Inbound, ExportFormat::Xlsx, date),
            "inbound-20250609.xlsx"
        );
    }
}
