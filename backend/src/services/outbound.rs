//! Outbound stock (transaksi keluar): goods shipped out of a warehouse

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{
    check, like_pattern, non_blank, numbering, ItemService, MovementQuery, PartnerKind,
    PartnerService, StockService, WarehouseService,
};
use shared::ledger::{outbound_deltas, reverse};
use shared::models::{DocumentKind, MovementLineInput};
use shared::types::PaginatedResponse;

#[derive(Clone)]
pub struct OutboundService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OutboundTransaction {
    pub id: Uuid,
    pub document_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub transaction_date: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub total_quantity: i64,
    pub line_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OutboundLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundDetail {
    #[serde(flatten)]
    pub header: OutboundTransaction,
    pub lines: Vec<OutboundLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutboundInput {
    pub customer_id: Option<Uuid>,
    pub warehouse_id: Uuid,
    pub transaction_date: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<MovementLineInput>,
}

#[derive(Debug, FromRow)]
struct StoredLine {
    item_id: Uuid,
    quantity: i32,
}

const SELECT_OUTBOUND: &str = r#"
    SELECT t.id, t.document_number, t.customer_id, c.name AS customer_name,
           t.warehouse_id, w.name AS warehouse_name, t.transaction_date, t.reference,
           t.notes, t.created_by,
           COALESCE((SELECT SUM(l.quantity) FROM outbound_lines l WHERE l.outbound_id = t.id), 0)::bigint
               AS total_quantity,
           (SELECT COUNT(*) FROM outbound_lines l WHERE l.outbound_id = t.id) AS line_count,
           t.created_at, t.updated_at
    FROM outbound_transactions t
    JOIN warehouses w ON w.id = t.warehouse_id
    LEFT JOIN customers c ON c.id = t.customer_id
"#;

const OUTBOUND_FILTER: &str = r#"
    WHERE ($1::date IS NULL OR t.transaction_date >= $1)
      AND ($2::date IS NULL OR t.transaction_date <= $2)
      AND ($3::uuid IS NULL OR t.warehouse_id = $3)
      AND ($4::text IS NULL OR t.document_number ILIKE $4 OR t.reference ILIKE $4 OR c.name ILIKE $4)
"#;

impl OutboundService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &MovementQuery) -> AppResult<PaginatedResponse<OutboundTransaction>> {
        let range = query.date_range()?;
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, OutboundTransaction>(&format!(
            "{} {} ORDER BY t.transaction_date DESC, t.document_number DESC LIMIT $5 OFFSET $6",
            SELECT_OUTBOUND, OUTBOUND_FILTER
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(query.warehouse_id)
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*) FROM outbound_transactions t
            LEFT JOIN customers c ON c.id = t.customer_id
            {}
            "#,
            OUTBOUND_FILTER
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(query.warehouse_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(rows, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<OutboundDetail> {
        let header =
            sqlx::query_as::<_, OutboundTransaction>(&format!("{} WHERE t.id = $1", SELECT_OUTBOUND))
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Outbound transaction".to_string()))?;

        let lines = sqlx::query_as::<_, OutboundLine>(
            r#"
            SELECT l.id, l.item_id, i.code AS item_code, i.name AS item_name, i.unit,
                   l.quantity, l.unit_price, l.unit_price * l.quantity AS total_price, l.notes
            FROM outbound_lines l
            JOIN items i ON i.id = l.item_id
            WHERE l.outbound_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(OutboundDetail { header, lines })
    }

    pub async fn create(&self, user_id: Uuid, input: OutboundInput) -> AppResult<OutboundDetail> {
        let mut tx = self.db.begin().await?;
        Self::validate_refs(&mut tx, &input).await?;

        let number =
            numbering::allocate(&mut tx, DocumentKind::Outbound, input.transaction_date).await?;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO outbound_transactions
                (document_number, customer_id, warehouse_id, transaction_date, reference, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(input.customer_id)
        .bind(input.warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.reference.clone()))
        .bind(non_blank(input.notes.clone()))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, id, &input.lines).await?;
        StockService::apply_deltas(&mut tx, outbound_deltas(input.warehouse_id, &input.lines)).await?;

        tx.commit().await?;
        tracing::info!(document_number = %number, lines = input.lines.len(), "Recorded outbound");
        self.get(id).await
    }

    /// Replace header and lines, moving stock by the difference
    pub async fn update(&self, id: Uuid, input: OutboundInput) -> AppResult<OutboundDetail> {
        let mut tx = self.db.begin().await?;

        let (old_warehouse, old_lines) = Self::lock(&mut tx, id).await?;
        Self::validate_refs(&mut tx, &input).await?;

        sqlx::query(
            r#"
            UPDATE outbound_transactions SET
                customer_id = $2, warehouse_id = $3, transaction_date = $4,
                reference = $5, notes = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.customer_id)
        .bind(input.warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.reference.clone()))
        .bind(non_blank(input.notes.clone()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM outbound_lines WHERE outbound_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, id, &input.lines).await?;

        let old = reverse(&outbound_deltas(old_warehouse, &old_lines));
        let new = outbound_deltas(input.warehouse_id, &input.lines);
        StockService::apply_deltas(&mut tx, old.into_iter().chain(new)).await?;

        tx.commit().await?;
        tracing::info!(outbound_id = %id, "Updated outbound");
        self.get(id).await
    }

    /// Delete the document and return its goods to stock
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (warehouse_id, lines) = Self::lock(&mut tx, id).await?;
        StockService::apply_deltas(&mut tx, reverse(&outbound_deltas(warehouse_id, &lines))).await?;

        sqlx::query("DELETE FROM outbound_transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(outbound_id = %id, "Deleted outbound");
        Ok(())
    }

    async fn validate_refs(conn: &mut PgConnection, input: &OutboundInput) -> AppResult<()> {
        check("lines", shared::validate_movement_lines(&input.lines))?;
        WarehouseService::ensure_exists(conn, input.warehouse_id).await?;
        if let Some(customer_id) = input.customer_id {
            PartnerService::ensure_exists(conn, PartnerKind::Customer, customer_id).await?;
        }
        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.item_id).collect();
        ItemService::ensure_exist(conn, &item_ids).await
    }

    async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<(Uuid, Vec<MovementLineInput>)> {
        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT warehouse_id FROM outbound_transactions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Outbound transaction".to_string()))?;

        let lines = sqlx::query_as::<_, StoredLine>(
            "SELECT item_id, quantity FROM outbound_lines WHERE outbound_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| MovementLineInput::new(l.item_id, l.quantity))
        .collect();

        Ok((warehouse_id, lines))
    }

    async fn insert_lines(conn: &mut PgConnection, id: Uuid, lines: &[MovementLineInput]) -> AppResult<()> {
        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO outbound_lines (outbound_id, item_id, quantity, unit_price, notes, line_no)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(non_blank(line.notes.clone()))
            .bind(line_no as i32 + 1)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
