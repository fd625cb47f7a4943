//! Warehouse stock (stok gudang): balances, the stock card and the ledger
//! that movement services apply their deltas through

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{like_pattern, ShelfCodeService};
use shared::ledger::{apply_delta, consolidate, running_balance, LedgerError};
use shared::models::StockDelta;
use shared::types::{DateRange, PaginatedResponse, Pagination};

#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A stock row with item and warehouse names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub min_stock: i32,
    pub warehouse_id: Uuid,
    pub warehouse_code: String,
    pub warehouse_name: String,
    pub shelf_code_id: Option<Uuid>,
    pub shelf_code: Option<String>,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub warehouse_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub q: Option<String>,
    #[serde(default)]
    pub low_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// An item whose total stock is below its minimum
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockItem {
    pub item_id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub min_stock: i32,
    pub total_stock: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockCardQuery {
    pub warehouse_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockCardEntry {
    pub date: NaiveDate,
    pub document_number: String,
    pub kind: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub reference: Option<String>,
    pub quantity: i64,
    #[sqlx(skip)]
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockCard {
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub warehouse_id: Option<Uuid>,
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub entries: Vec<StockCardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AssignShelfInput {
    pub shelf_code_id: Option<Uuid>,
}

const SELECT_STOCK: &str = r#"
    SELECT ws.id, ws.item_id, i.code AS item_code, i.name AS item_name, i.unit, i.min_stock,
           ws.warehouse_id, w.code AS warehouse_code, w.name AS warehouse_name,
           ws.shelf_code_id, s.code AS shelf_code, ws.quantity, ws.updated_at
    FROM warehouse_stocks ws
    JOIN items i ON i.id = ws.item_id
    JOIN warehouses w ON w.id = ws.warehouse_id
    LEFT JOIN shelf_codes s ON s.id = ws.shelf_code_id
"#;

const STOCK_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR ws.warehouse_id = $1)
      AND ($2::uuid IS NULL OR ws.item_id = $2)
      AND ($3::text IS NULL OR i.code ILIKE $3 OR i.name ILIKE $3)
      AND (NOT $4 OR ws.quantity < i.min_stock)
"#;

/// Every movement line of one item as a signed quantity per warehouse
const ITEM_MOVEMENTS: &str = r#"
    WITH movements AS (
        SELECT t.transaction_date AS date, t.created_at, t.document_number,
               'inbound'::text AS kind, t.warehouse_id, t.reference,
               l.quantity::bigint AS quantity, l.line_no
        FROM inbound_lines l JOIN inbound_transactions t ON t.id = l.inbound_id
        WHERE l.item_id = $1
        UNION ALL
        SELECT t.transaction_date, t.created_at, t.document_number,
               'outbound'::text, t.warehouse_id, t.reference,
               -l.quantity::bigint, l.line_no
        FROM outbound_lines l JOIN outbound_transactions t ON t.id = l.outbound_id
        WHERE l.item_id = $1
        UNION ALL
        SELECT t.transaction_date, t.created_at, t.document_number,
               'transfer_out'::text, t.source_warehouse_id, NULL::text,
               -l.quantity::bigint, l.line_no
        FROM transfer_lines l JOIN transfers t ON t.id = l.transfer_id
        WHERE l.item_id = $1
        UNION ALL
        SELECT t.transaction_date, t.created_at, t.document_number,
               'transfer_in'::text, t.destination_warehouse_id, NULL::text,
               l.quantity::bigint, l.line_no
        FROM transfer_lines l JOIN transfers t ON t.id = l.transfer_id
        WHERE l.item_id = $1
        UNION ALL
        SELECT c.count_date, c.created_at, c.document_number,
               'stock_count'::text, c.warehouse_id, NULL::text,
               l.difference::bigint, l.line_no
        FROM stock_count_lines l JOIN stock_counts c ON c.id = l.stock_count_id
        WHERE l.item_id = $1
    )
"#;

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &StockQuery) -> AppResult<PaginatedResponse<StockRow>> {
        let pagination = Pagination::from_query(query.page, query.per_page);
        let pattern = like_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "{} {} ORDER BY i.code, w.code LIMIT $5 OFFSET $6",
            SELECT_STOCK, STOCK_FILTER
        ))
        .bind(query.warehouse_id)
        .bind(query.item_id)
        .bind(&pattern)
        .bind(query.low_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*) FROM warehouse_stocks ws
            JOIN items i ON i.id = ws.item_id
            {}
            "#,
            STOCK_FILTER
        ))
        .bind(query.warehouse_id)
        .bind(query.item_id)
        .bind(&pattern)
        .bind(query.low_only)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(rows, pagination, total))
    }

    /// Items whose total stock is below their minimum, most urgent first
    pub async fn low_stock(&self, limit: Option<i64>) -> AppResult<Vec<LowStockItem>> {
        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT i.id AS item_id, i.code, i.name, i.unit, i.min_stock,
                   COALESCE(SUM(ws.quantity), 0)::bigint AS total_stock
            FROM items i
            LEFT JOIN warehouse_stocks ws ON ws.item_id = i.id
            GROUP BY i.id
            HAVING COALESCE(SUM(ws.quantity), 0) < i.min_stock
            ORDER BY COALESCE(SUM(ws.quantity), 0) - i.min_stock, i.code
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Chronological movements of one item with a running balance
    pub async fn stock_card(&self, item_id: Uuid, query: &StockCardQuery) -> AppResult<StockCard> {
        let range = DateRange::new(query.start_date, query.end_date)
            .map_err(|message| AppError::validation("start_date", message))?;

        let (item_code, item_name) =
            sqlx::query_as::<_, (String, String)>("SELECT code, name FROM items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let opening_balance = match range.start {
            Some(start) => {
                sqlx::query_scalar::<_, i64>(&format!(
                    r#"
                    {}
                    SELECT COALESCE(SUM(quantity), 0)::bigint FROM movements
                    WHERE ($2::uuid IS NULL OR warehouse_id = $2) AND date < $3
                    "#,
                    ITEM_MOVEMENTS
                ))
                .bind(item_id)
                .bind(query.warehouse_id)
                .bind(start)
                .fetch_one(&self.db)
                .await?
            }
            None => 0,
        };

        let mut entries = sqlx::query_as::<_, StockCardEntry>(&format!(
            r#"
            {}
            SELECT m.date, m.document_number, m.kind, m.warehouse_id,
                   w.name AS warehouse_name, m.reference, m.quantity
            FROM movements m
            JOIN warehouses w ON w.id = m.warehouse_id
            WHERE ($2::uuid IS NULL OR m.warehouse_id = $2)
              AND ($3::date IS NULL OR m.date >= $3)
              AND ($4::date IS NULL OR m.date <= $4)
            ORDER BY m.date, m.created_at, m.document_number, m.line_no, m.quantity
            "#,
            ITEM_MOVEMENTS
        ))
        .bind(item_id)
        .bind(query.warehouse_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let quantities: Vec<i64> = entries.iter().map(|e| e.quantity).collect();
        let balances = running_balance(opening_balance, &quantities);
        for (entry, balance) in entries.iter_mut().zip(&balances) {
            entry.balance = *balance;
        }

        Ok(StockCard {
            item_id,
            item_code,
            item_name,
            warehouse_id: query.warehouse_id,
            opening_balance,
            closing_balance: balances.last().copied().unwrap_or(opening_balance),
            entries,
        })
    }

    /// Set or clear the bin location of a stock row
    pub async fn assign_shelf(&self, id: Uuid, input: AssignShelfInput) -> AppResult<StockRow> {
        let mut conn = self.db.acquire().await?;

        let warehouse_id =
            sqlx::query_scalar::<_, Uuid>("SELECT warehouse_id FROM warehouse_stocks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        if let Some(shelf_code_id) = input.shelf_code_id {
            ShelfCodeService::ensure_in_warehouse(&mut conn, shelf_code_id, warehouse_id).await?;
        }

        sqlx::query("UPDATE warehouse_stocks SET shelf_code_id = $2 WHERE id = $1")
            .bind(id)
            .bind(input.shelf_code_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query_as::<_, StockRow>(&format!("{} WHERE ws.id = $1", SELECT_STOCK))
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .map_err(Into::into)
    }

    /// Current quantity of one stock row, locking it for the transaction
    pub(crate) async fn locked_quantity(
        conn: &mut PgConnection,
        item_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM warehouse_stocks WHERE item_id = $1 AND warehouse_id = $2 FOR UPDATE",
        )
        .bind(item_id)
        .bind(warehouse_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(quantity.map(i64::from).unwrap_or(0))
    }

    /// Apply stock deltas inside the caller's transaction
    ///
    /// Deltas are consolidated first, so rows are locked once each and in
    /// key order. Any row that would go below zero fails the whole call.
    pub(crate) async fn apply_deltas(
        conn: &mut PgConnection,
        deltas: impl IntoIterator<Item = StockDelta>,
    ) -> AppResult<()> {
        for delta in consolidate(deltas) {
            let key = delta.key;

            sqlx::query(
                r#"
                INSERT INTO warehouse_stocks (item_id, warehouse_id, quantity)
                VALUES ($1, $2, 0)
                ON CONFLICT (item_id, warehouse_id) DO NOTHING
                "#,
            )
            .bind(key.item_id)
            .bind(key.warehouse_id)
            .execute(&mut *conn)
            .await?;

            let current = Self::locked_quantity(conn, key.item_id, key.warehouse_id).await?;
            let updated = match apply_delta(current, delta.quantity) {
                Ok(updated) => updated,
                Err(err @ LedgerError::InsufficientStock { .. }) => {
                    return Err(Self::insufficient(conn, &delta, err).await);
                }
                Err(err) => return Err(err.into()),
            };

            sqlx::query(
                r#"
                UPDATE warehouse_stocks
                SET quantity = $3, shelf_code_id = COALESCE($4, shelf_code_id)
                WHERE item_id = $1 AND warehouse_id = $2
                "#,
            )
            .bind(key.item_id)
            .bind(key.warehouse_id)
            .bind(updated as i32)
            .bind(delta.shelf_code_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Describe a failed delta with item code and warehouse name
    async fn insufficient(conn: &mut PgConnection, delta: &StockDelta, err: LedgerError) -> AppError {
        let names = sqlx::query_as::<_, (String, String)>(
            "SELECT i.code, w.name FROM items i, warehouses w WHERE i.id = $1 AND w.id = $2",
        )
        .bind(delta.key.item_id)
        .bind(delta.key.warehouse_id)
        .fetch_optional(&mut *conn)
        .await;

        match (names, err) {
            (Ok(Some((code, warehouse))), LedgerError::InsufficientStock { available, requested }) => {
                AppError::InsufficientStock(format!(
                    "item {} in {}: available {}, requested {}",
                    code, warehouse, available, requested
                ))
            }
            (_, err) => err.into(),
        }
    }
}
