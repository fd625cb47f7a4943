//! Inbound stock (stok masuk): goods received into a warehouse

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{
    check, like_pattern, non_blank, numbering, ItemService, MovementQuery, PartnerKind,
    PartnerService, ShelfCodeService, StockService, WarehouseService,
};
use shared::ledger::{inbound_deltas, reverse};
use shared::models::{DocumentKind, MovementLineInput};
use shared::types::PaginatedResponse;

#[derive(Clone)]
pub struct InboundService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InboundTransaction {
    pub id: Uuid,
    pub document_number: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
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
pub struct InboundLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub shelf_code_id: Option<Uuid>,
    pub shelf_code: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboundDetail {
    #[serde(flatten)]
    pub header: InboundTransaction,
    pub lines: Vec<InboundLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundInput {
    pub supplier_id: Option<Uuid>,
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

const SELECT_INBOUND: &str = r#"
    SELECT t.id, t.document_number, t.supplier_id, s.name AS supplier_name,
           t.warehouse_id, w.name AS warehouse_name, t.transaction_date, t.reference,
           t.notes, t.created_by,
           COALESCE((SELECT SUM(l.quantity) FROM inbound_lines l WHERE l.inbound_id = t.id), 0)::bigint
               AS total_quantity,
           (SELECT COUNT(*) FROM inbound_lines l WHERE l.inbound_id = t.id) AS line_count,
           t.created_at, t.updated_at
    FROM inbound_transactions t
    JOIN warehouses w ON w.id = t.warehouse_id
    LEFT JOIN suppliers s ON s.id = t.supplier_id
"#;

const INBOUND_FILTER: &str = r#"
    WHERE ($1::date IS NULL OR t.transaction_date >= $1)
      AND ($2::date IS NULL OR t.transaction_date <= $2)
      AND ($3::uuid IS NULL OR t.warehouse_id = $3)
      AND ($4::text IS NULL OR t.document_number ILIKE $4 OR t.reference ILIKE $4 OR s.name ILIKE $4)
"#;

impl InboundService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &MovementQuery) -> AppResult<PaginatedResponse<InboundTransaction>> {
        let range = query.date_range()?;
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, InboundTransaction>(&format!(
            "{} {} ORDER BY t.transaction_date DESC, t.document_number DESC LIMIT $5 OFFSET $6",
            SELECT_INBOUND, INBOUND_FILTER
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
            SELECT COUNT(*) FROM inbound_transactions t
            LEFT JOIN suppliers s ON s.id = t.supplier_id
            {}
            "#,
            INBOUND_FILTER
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(query.warehouse_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(rows, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<InboundDetail> {
        let header = sqlx::query_as::<_, InboundTransaction>(&format!("{} WHERE t.id = $1", SELECT_INBOUND))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inbound transaction".to_string()))?;

        let lines = sqlx::query_as::<_, InboundLine>(
            r#"
            SELECT l.id, l.item_id, i.code AS item_code, i.name AS item_name, i.unit,
                   l.shelf_code_id, sc.code AS shelf_code, l.quantity, l.unit_price,
                   l.unit_price * l.quantity AS total_price, l.notes
            FROM inbound_lines l
            JOIN items i ON i.id = l.item_id
            LEFT JOIN shelf_codes sc ON sc.id = l.shelf_code_id
            WHERE l.inbound_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(InboundDetail { header, lines })
    }

    pub async fn create(&self, user_id: Uuid, input: InboundInput) -> AppResult<InboundDetail> {
        let mut tx = self.db.begin().await?;
        let (id, number) = Self::create_in(&mut tx, user_id, &input).await?;
        tx.commit().await?;

        tracing::info!(document_number = %number, lines = input.lines.len(), "Recorded inbound");
        self.get(id).await
    }

    /// Record an inbound document on an open transaction (shared with imports)
    pub(crate) async fn create_in(
        conn: &mut PgConnection,
        user_id: Uuid,
        input: &InboundInput,
    ) -> AppResult<(Uuid, String)> {
        Self::validate_refs(conn, input).await?;

        let number = numbering::allocate(conn, DocumentKind::Inbound, input.transaction_date).await?;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO inbound_transactions
                (document_number, supplier_id, warehouse_id, transaction_date, reference, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(input.supplier_id)
        .bind(input.warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.reference.clone()))
        .bind(non_blank(input.notes.clone()))
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Self::insert_lines(conn, id, &input.lines).await?;
        StockService::apply_deltas(conn, inbound_deltas(input.warehouse_id, &input.lines)).await?;

        Ok((id, number))
    }

    /// Replace header and lines, moving stock by the difference
    pub async fn update(&self, id: Uuid, input: InboundInput) -> AppResult<InboundDetail> {
        let mut tx = self.db.begin().await?;

        let (old_warehouse, old_lines) = Self::lock(&mut tx, id).await?;
        Self::validate_refs(&mut tx, &input).await?;

        sqlx::query(
            r#"
            UPDATE inbound_transactions SET
                supplier_id = $2, warehouse_id = $3, transaction_date = $4,
                reference = $5, notes = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.supplier_id)
        .bind(input.warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.reference.clone()))
        .bind(non_blank(input.notes.clone()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM inbound_lines WHERE inbound_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, id, &input.lines).await?;

        let old = reverse(&inbound_deltas(old_warehouse, &old_lines));
        let new = inbound_deltas(input.warehouse_id, &input.lines);
        StockService::apply_deltas(&mut tx, old.into_iter().chain(new)).await?;

        tx.commit().await?;
        tracing::info!(inbound_id = %id, "Updated inbound");
        self.get(id).await
    }

    /// Delete the document and take its goods back out of stock
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (warehouse_id, lines) = Self::lock(&mut tx, id).await?;
        StockService::apply_deltas(&mut tx, reverse(&inbound_deltas(warehouse_id, &lines))).await?;

        sqlx::query("DELETE FROM inbound_transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(inbound_id = %id, "Deleted inbound");
        Ok(())
    }

    async fn validate_refs(conn: &mut PgConnection, input: &InboundInput) -> AppResult<()> {
        check("lines", shared::validate_movement_lines(&input.lines))?;
        WarehouseService::ensure_exists(conn, input.warehouse_id).await?;
        if let Some(supplier_id) = input.supplier_id {
            PartnerService::ensure_exists(conn, PartnerKind::Supplier, supplier_id).await?;
        }

        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.item_id).collect();
        ItemService::ensure_exist(conn, &item_ids).await?;

        for shelf_code_id in input.lines.iter().filter_map(|l| l.shelf_code_id) {
            ShelfCodeService::ensure_in_warehouse(conn, shelf_code_id, input.warehouse_id).await?;
        }
        Ok(())
    }

    /// Lock the header and return the warehouse and lines it was recorded with
    async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<(Uuid, Vec<MovementLineInput>)> {
        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT warehouse_id FROM inbound_transactions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Inbound transaction".to_string()))?;

        let lines = sqlx::query_as::<_, StoredLine>(
            "SELECT item_id, quantity FROM inbound_lines WHERE inbound_id = $1",
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
                INSERT INTO inbound_lines
                    (inbound_id, item_id, shelf_code_id, quantity, unit_price, notes, line_no)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(line.item_id)
            .bind(line.shelf_code_id)
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
