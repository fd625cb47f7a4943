//! Transfers between warehouses (transfer gudang)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{
    check, like_pattern, non_blank, numbering, ItemService, MovementQuery, StockService,
    WarehouseService,
};
use shared::ledger::{reverse, transfer_deltas};
use shared::models::{DocumentKind, MovementLineInput};
use shared::types::PaginatedResponse;

#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Transfer {
    pub id: Uuid,
    pub document_number: String,
    pub source_warehouse_id: Uuid,
    pub source_warehouse_name: String,
    pub destination_warehouse_id: Uuid,
    pub destination_warehouse_name: String,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub total_quantity: i64,
    pub line_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransferLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferDetail {
    #[serde(flatten)]
    pub header: Transfer,
    pub lines: Vec<TransferLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
    pub lines: Vec<MovementLineInput>,
}

#[derive(Debug, FromRow)]
struct LockedTransfer {
    source_warehouse_id: Uuid,
    destination_warehouse_id: Uuid,
}

#[derive(Debug, FromRow)]
struct StoredLine {
    item_id: Uuid,
    quantity: i32,
}

const SELECT_TRANSFER: &str = r#"
    SELECT t.id, t.document_number,
           t.source_warehouse_id, ws.name AS source_warehouse_name,
           t.destination_warehouse_id, wd.name AS destination_warehouse_name,
           t.transaction_date, t.notes, t.created_by,
           COALESCE((SELECT SUM(l.quantity) FROM transfer_lines l WHERE l.transfer_id = t.id), 0)::bigint
               AS total_quantity,
           (SELECT COUNT(*) FROM transfer_lines l WHERE l.transfer_id = t.id) AS line_count,
           t.created_at, t.updated_at
    FROM transfers t
    JOIN warehouses ws ON ws.id = t.source_warehouse_id
    JOIN warehouses wd ON wd.id = t.destination_warehouse_id
"#;

// A warehouse filter matches either end of the transfer
const TRANSFER_FILTER: &str = r#"
    WHERE ($1::date IS NULL OR t.transaction_date >= $1)
      AND ($2::date IS NULL OR t.transaction_date <= $2)
      AND ($3::uuid IS NULL OR t.source_warehouse_id = $3 OR t.destination_warehouse_id = $3)
      AND ($4::text IS NULL OR t.document_number ILIKE $4 OR t.notes ILIKE $4)
"#;

impl TransferService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &MovementQuery) -> AppResult<PaginatedResponse<Transfer>> {
        let range = query.date_range()?;
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, Transfer>(&format!(
            "{} {} ORDER BY t.transaction_date DESC, t.document_number DESC LIMIT $5 OFFSET $6",
            SELECT_TRANSFER, TRANSFER_FILTER
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
            "SELECT COUNT(*) FROM transfers t {}",
            TRANSFER_FILTER
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(query.warehouse_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(rows, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<TransferDetail> {
        let header = sqlx::query_as::<_, Transfer>(&format!("{} WHERE t.id = $1", SELECT_TRANSFER))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        let lines = sqlx::query_as::<_, TransferLine>(
            r#"
            SELECT l.id, l.item_id, i.code AS item_code, i.name AS item_name, i.unit,
                   l.quantity, l.notes
            FROM transfer_lines l
            JOIN items i ON i.id = l.item_id
            WHERE l.transfer_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(TransferDetail { header, lines })
    }

    pub async fn create(&self, user_id: Uuid, input: TransferInput) -> AppResult<TransferDetail> {
        let mut tx = self.db.begin().await?;
        Self::validate_refs(&mut tx, &input).await?;

        let number =
            numbering::allocate(&mut tx, DocumentKind::Transfer, input.transaction_date).await?;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transfers
                (document_number, source_warehouse_id, destination_warehouse_id,
                 transaction_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(input.source_warehouse_id)
        .bind(input.destination_warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.notes.clone()))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, id, &input.lines).await?;
        StockService::apply_deltas(&mut tx, Self::deltas_for(&input)).await?;

        tx.commit().await?;
        tracing::info!(document_number = %number, lines = input.lines.len(), "Recorded transfer");
        self.get(id).await
    }

    /// Replace header and lines, moving stock by the difference
    pub async fn update(&self, id: Uuid, input: TransferInput) -> AppResult<TransferDetail> {
        let mut tx = self.db.begin().await?;

        let (locked, old_lines) = Self::lock(&mut tx, id).await?;
        Self::validate_refs(&mut tx, &input).await?;

        sqlx::query(
            r#"
            UPDATE transfers SET
                source_warehouse_id = $2, destination_warehouse_id = $3,
                transaction_date = $4, notes = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.source_warehouse_id)
        .bind(input.destination_warehouse_id)
        .bind(input.transaction_date)
        .bind(non_blank(input.notes.clone()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM transfer_lines WHERE transfer_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, id, &input.lines).await?;

        let old = reverse(&transfer_deltas(
            locked.source_warehouse_id,
            locked.destination_warehouse_id,
            &old_lines,
        ));
        StockService::apply_deltas(&mut tx, old.into_iter().chain(Self::deltas_for(&input))).await?;

        tx.commit().await?;
        tracing::info!(transfer_id = %id, "Updated transfer");
        self.get(id).await
    }

    /// Delete the transfer and move its goods back to the source warehouse
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (locked, lines) = Self::lock(&mut tx, id).await?;
        let deltas = transfer_deltas(
            locked.source_warehouse_id,
            locked.destination_warehouse_id,
            &lines,
        );
        StockService::apply_deltas(&mut tx, reverse(&deltas)).await?;

        sqlx::query("DELETE FROM transfers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(transfer_id = %id, "Deleted transfer");
        Ok(())
    }

    fn deltas_for(input: &TransferInput) -> Vec<shared::models::StockDelta> {
        transfer_deltas(
            input.source_warehouse_id,
            input.destination_warehouse_id,
            &input.lines,
        )
    }

    async fn validate_refs(conn: &mut PgConnection, input: &TransferInput) -> AppResult<()> {
        check(
            "destination_warehouse_id",
            shared::validate_transfer_warehouses(input.source_warehouse_id, input.destination_warehouse_id),
        )?;
        check("lines", shared::validate_movement_lines(&input.lines))?;
        WarehouseService::ensure_exists(conn, input.source_warehouse_id).await?;
        WarehouseService::ensure_exists(conn, input.destination_warehouse_id).await?;
        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.item_id).collect();
        ItemService::ensure_exist(conn, &item_ids).await
    }

    async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<(LockedTransfer, Vec<MovementLineInput>)> {
        let locked = sqlx::query_as::<_, LockedTransfer>(
            "SELECT source_warehouse_id, destination_warehouse_id FROM transfers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        let lines = sqlx::query_as::<_, StoredLine>(
            "SELECT item_id, quantity FROM transfer_lines WHERE transfer_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| MovementLineInput::new(l.item_id, l.quantity))
        .collect();

        Ok((locked, lines))
    }

    async fn insert_lines(conn: &mut PgConnection, id: Uuid, lines: &[MovementLineInput]) -> AppResult<()> {
        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transfer_lines (transfer_id, item_id, quantity, notes, line_no)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(non_blank(line.notes.clone()))
            .bind(line_no as i32 + 1)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
