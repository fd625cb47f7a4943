//! Physical stock counts (stok opname)
//!
//! Each line snapshots the system quantity at the time of the count and
//! adjusts stock by the difference, so the row ends at the counted figure.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{
    check, like_pattern, non_blank, numbering, ItemService, MovementQuery, StockService,
    WarehouseService,
};
use shared::ledger::{count_deltas, reverse};
use shared::models::{CountLineInput, CountedLine, DocumentKind};
use shared::types::PaginatedResponse;

#[derive(Clone)]
pub struct StockCountService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockCount {
    pub id: Uuid,
    pub document_number: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub count_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub line_count: i64,
    pub total_difference: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockCountLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub system_quantity: i32,
    pub counted_quantity: i32,
    pub difference: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockCountDetail {
    #[serde(flatten)]
    pub header: StockCount,
    pub lines: Vec<StockCountLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockCountInput {
    pub warehouse_id: Uuid,
    pub count_date: NaiveDate,
    pub notes: Option<String>,
    pub lines: Vec<CountLineInput>,
}

#[derive(Debug, FromRow)]
struct StoredLine {
    item_id: Uuid,
    system_quantity: i32,
    counted_quantity: i32,
}

const SELECT_STOCK_COUNT: &str = r#"
    SELECT c.id, c.document_number, c.warehouse_id, w.name AS warehouse_name,
           c.count_date, c.notes, c.created_by,
           (SELECT COUNT(*) FROM stock_count_lines l WHERE l.stock_count_id = c.id) AS line_count,
           COALESCE((SELECT SUM(l.difference) FROM stock_count_lines l WHERE l.stock_count_id = c.id), 0)::bigint
               AS total_difference,
           c.created_at, c.updated_at
    FROM stock_counts c
    JOIN warehouses w ON w.id = c.warehouse_id
"#;

const STOCK_COUNT_FILTER: &str = r#"
    WHERE ($1::date IS NULL OR c.count_date >= $1)
      AND ($2::date IS NULL OR c.count_date <= $2)
      AND ($3::uuid IS NULL OR c.warehouse_id = $3)
      AND ($4::text IS NULL OR c.document_number ILIKE $4 OR c.notes ILIKE $4)
"#;

impl StockCountService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &MovementQuery) -> AppResult<PaginatedResponse<StockCount>> {
        let range = query.date_range()?;
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, StockCount>(&format!(
            "{} {} ORDER BY c.count_date DESC, c.document_number DESC LIMIT $5 OFFSET $6",
            SELECT_STOCK_COUNT, STOCK_COUNT_FILTER
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
            "SELECT COUNT(*) FROM stock_counts c {}",
            STOCK_COUNT_FILTER
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(query.warehouse_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(rows, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<StockCountDetail> {
        let header =
            sqlx::query_as::<_, StockCount>(&format!("{} WHERE c.id = $1", SELECT_STOCK_COUNT))
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Stock count".to_string()))?;

        let lines = sqlx::query_as::<_, StockCountLine>(
            r#"
            SELECT l.id, l.item_id, i.code AS item_code, i.name AS item_name, i.unit,
                   l.system_quantity, l.counted_quantity, l.difference, l.notes
            FROM stock_count_lines l
            JOIN items i ON i.id = l.item_id
            WHERE l.stock_count_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockCountDetail { header, lines })
    }

    pub async fn create(&self, user_id: Uuid, input: StockCountInput) -> AppResult<StockCountDetail> {
        let mut tx = self.db.begin().await?;
        Self::validate_refs(&mut tx, &input).await?;

        let number = numbering::allocate(&mut tx, DocumentKind::StockCount, input.count_date).await?;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_counts (document_number, warehouse_id, count_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(input.warehouse_id)
        .bind(input.count_date)
        .bind(non_blank(input.notes.clone()))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::snapshot_and_apply(&mut tx, id, &input).await?;

        tx.commit().await?;
        tracing::info!(document_number = %number, lines = input.lines.len(), "Recorded stock count");
        self.get(id).await
    }

    /// Undo the old adjustments, then re-snapshot and apply the new counts
    pub async fn update(&self, id: Uuid, input: StockCountInput) -> AppResult<StockCountDetail> {
        let mut tx = self.db.begin().await?;

        let (old_warehouse, old_lines) = Self::lock(&mut tx, id).await?;
        Self::validate_refs(&mut tx, &input).await?;
        StockService::apply_deltas(&mut tx, reverse(&count_deltas(old_warehouse, &old_lines))).await?;

        sqlx::query(
            "UPDATE stock_counts SET warehouse_id = $2, count_date = $3, notes = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(input.warehouse_id)
        .bind(input.count_date)
        .bind(non_blank(input.notes.clone()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stock_count_lines WHERE stock_count_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::snapshot_and_apply(&mut tx, id, &input).await?;

        tx.commit().await?;
        tracing::info!(stock_count_id = %id, "Updated stock count");
        self.get(id).await
    }

    /// Delete the count and undo its adjustments
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (warehouse_id, lines) = Self::lock(&mut tx, id).await?;
        StockService::apply_deltas(&mut tx, reverse(&count_deltas(warehouse_id, &lines))).await?;

        sqlx::query("DELETE FROM stock_counts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(stock_count_id = %id, "Deleted stock count");
        Ok(())
    }

    /// Snapshot system quantities, store the lines and apply the differences
    async fn snapshot_and_apply(
        conn: &mut PgConnection,
        id: Uuid,
        input: &StockCountInput,
    ) -> AppResult<()> {
        // Lock rows in item order, the same order apply_deltas uses
        let mut order: Vec<usize> = (0..input.lines.len()).collect();
        order.sort_by_key(|&i| input.lines[i].item_id);

        let mut counted = vec![None; input.lines.len()];
        for i in order {
            let line = &input.lines[i];
            let system_quantity =
                StockService::locked_quantity(conn, line.item_id, input.warehouse_id).await?;
            counted[i] = Some(CountedLine {
                item_id: line.item_id,
                system_quantity,
                counted_quantity: i64::from(line.counted_quantity),
            });
        }
        let counted: Vec<CountedLine> = counted.into_iter().flatten().collect();

        for (line_no, (line, snapshot)) in input.lines.iter().zip(&counted).enumerate() {
            sqlx::query(
                r#"
                INSERT INTO stock_count_lines
                    (stock_count_id, item_id, system_quantity, counted_quantity, difference, notes, line_no)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(line.item_id)
            .bind(snapshot.system_quantity as i32)
            .bind(line.counted_quantity)
            .bind(snapshot.difference() as i32)
            .bind(non_blank(line.notes.clone()))
            .bind(line_no as i32 + 1)
            .execute(&mut *conn)
            .await?;
        }

        StockService::apply_deltas(conn, count_deltas(input.warehouse_id, &counted)).await
    }

    async fn validate_refs(conn: &mut PgConnection, input: &StockCountInput) -> AppResult<()> {
        check("lines", shared::validate_count_lines(&input.lines))?;
        WarehouseService::ensure_exists(conn, input.warehouse_id).await?;
        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.item_id).collect();
        ItemService::ensure_exist(conn, &item_ids).await
    }

    async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<(Uuid, Vec<CountedLine>)> {
        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT warehouse_id FROM stock_counts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock count".to_string()))?;

        let lines = sqlx::query_as::<_, StoredLine>(
            "SELECT item_id, system_quantity, counted_quantity FROM stock_count_lines WHERE stock_count_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| CountedLine {
            item_id: l.item_id,
            system_quantity: i64::from(l.system_quantity),
            counted_quantity: i64::from(l.counted_quantity),
        })
        .collect();

        Ok((warehouse_id, lines))
    }
}
