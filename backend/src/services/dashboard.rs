//! Dashboard summary

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::LowStockItem;
use crate::services::StockService;

const RECENT_DOCUMENTS: i64 = 5;
const LOW_STOCK_ITEMS: i64 = 10;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub item_count: i64,
    pub warehouse_count: i64,
    pub supplier_count: i64,
    pub customer_count: i64,
    pub total_stock: i64,
    pub low_stock_count: i64,
    pub month_start: NaiveDate,
    pub month_inbound_quantity: i64,
    pub month_inbound_documents: i64,
    pub month_outbound_quantity: i64,
    pub month_outbound_documents: i64,
    pub recent_documents: Vec<RecentDocument>,
    pub low_stock_items: Vec<LowStockItem>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentDocument {
    pub id: Uuid,
    pub kind: String,
    pub document_number: String,
    pub date: NaiveDate,
    pub warehouse_name: String,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct Counts {
    item_count: i64,
    warehouse_count: i64,
    supplier_count: i64,
    customer_count: i64,
    total_stock: i64,
    low_stock_count: i64,
}

#[derive(Debug, FromRow)]
struct MonthTotals {
    quantity: i64,
    documents: i64,
}

/// First day of the month containing `date` and of the month after it
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    (start, next.unwrap_or(start))
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn summary(&self) -> AppResult<DashboardSummary> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items) AS item_count,
                (SELECT COUNT(*) FROM warehouses) AS warehouse_count,
                (SELECT COUNT(*) FROM suppliers) AS supplier_count,
                (SELECT COUNT(*) FROM customers) AS customer_count,
                (SELECT COALESCE(SUM(quantity), 0)::bigint FROM warehouse_stocks) AS total_stock,
                (SELECT COUNT(*) FROM (
                    SELECT i.id FROM items i
                    LEFT JOIN warehouse_stocks ws ON ws.item_id = i.id
                    GROUP BY i.id
                    HAVING COALESCE(SUM(ws.quantity), 0) < i.min_stock
                ) low) AS low_stock_count
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let (month_start, next_month) = month_bounds(Utc::now().date_naive());
        let inbound = self.month_totals("inbound_transactions", "inbound_lines", "inbound_id", month_start, next_month).await?;
        let outbound = self.month_totals("outbound_transactions", "outbound_lines", "outbound_id", month_start, next_month).await?;

        let recent_documents = sqlx::query_as::<_, RecentDocument>(
            r#"
            SELECT * FROM (
                SELECT t.id, 'inbound'::text AS kind, t.document_number, t.transaction_date AS date,
                       w.name AS warehouse_name, t.created_at
                FROM inbound_transactions t JOIN warehouses w ON w.id = t.warehouse_id
                UNION ALL
                SELECT t.id, 'outbound'::text, t.document_number, t.transaction_date,
                       w.name, t.created_at
                FROM outbound_transactions t JOIN warehouses w ON w.id = t.warehouse_id
                UNION ALL
                SELECT t.id, 'transfer'::text, t.document_number, t.transaction_date,
                       w.name, t.created_at
                FROM transfers t JOIN warehouses w ON w.id = t.source_warehouse_id
                UNION ALL
                SELECT c.id, 'stock_count'::text, c.document_number, c.count_date,
                       w.name, c.created_at
                FROM stock_counts c JOIN warehouses w ON w.id = c.warehouse_id
            ) docs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(RECENT_DOCUMENTS)
        .fetch_all(&self.db)
        .await?;

        let low_stock_items = StockService::new(self.db.clone())
            .low_stock(Some(LOW_STOCK_ITEMS))
            .await?;

        Ok(DashboardSummary {
            item_count: counts.item_count,
            warehouse_count: counts.warehouse_count,
            supplier_count: counts.supplier_count,
            customer_count: counts.customer_count,
            total_stock: counts.total_stock,
            low_stock_count: counts.low_stock_count,
            month_start,
            month_inbound_quantity: inbound.quantity,
            month_inbound_documents: inbound.documents,
            month_outbound_quantity: outbound.quantity,
            month_outbound_documents: outbound.documents,
            recent_documents,
            low_stock_items,
        })
    }

    async fn month_totals(
        &self,
        header: &str,
        lines: &str,
        fk: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<MonthTotals> {
        let totals = sqlx::query_as::<_, MonthTotals>(&format!(
            r#"
            SELECT
                COALESCE((SELECT SUM(l.quantity) FROM {lines} l JOIN {header} t ON t.id = l.{fk}
                          WHERE t.transaction_date >= $1 AND t.transaction_date < $2), 0)::bigint
                    AS quantity,
                (SELECT COUNT(*) FROM {header} t
                 WHERE t.transaction_date >= $1 AND t.transaction_date < $2) AS documents
            "#,
            header = header,
            lines = lines,
            fk = fk,
        ))
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(month_bounds(d(2025, 6, 18)), (d(2025, 6, 1), d(2025, 7, 1)));
        assert_eq!(month_bounds(d(2025, 12, 31)), (d(2025, 12, 1), d(2026, 1, 1)));
    }
}
