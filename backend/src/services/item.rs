//! Item (barang) master data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{check, like_pattern, non_blank, SearchQuery};
use shared::types::PaginatedResponse;

pub const DEFAULT_UNIT: &str = "pcs";

#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub description: Option<String>,
    pub min_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item with its stock summed over all warehouses
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: Item,
    pub total_stock: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_stock: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_stock: Option<i32>,
}

const ITEM_COLUMNS: &str =
    "id, code, name, category, unit, description, min_stock, created_at, updated_at";

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &SearchQuery) -> AppResult<PaginatedResponse<Item>> {
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let items = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {} FROM items
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)
            ORDER BY code
            LIMIT $2 OFFSET $3
            "#,
            ITEM_COLUMNS
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM items WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(items, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ItemDetail> {
        sqlx::query_as::<_, ItemDetail>(
            r#"
            SELECT i.id, i.code, i.name, i.category, i.unit, i.description, i.min_stock,
                   i.created_at, i.updated_at,
                   COALESCE(SUM(ws.quantity), 0)::bigint AS total_stock
            FROM items i
            LEFT JOIN warehouse_stocks ws ON ws.item_id = i.id
            WHERE i.id = $1
            GROUP BY i.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn create(&self, input: CreateItemInput) -> AppResult<Item> {
        let mut conn = self.db.acquire().await?;
        let item = Self::insert(&mut conn, input).await?;
        tracing::info!(code = %item.code, "Created item");
        Ok(item)
    }

    /// Validate and insert on an existing connection (shared with imports)
    pub(crate) async fn insert(conn: &mut PgConnection, input: CreateItemInput) -> AppResult<Item> {
        let code = input.code.trim().to_string();
        check("code", shared::validate_code(&code))?;
        check("name", shared::validate_name(&input.name))?;
        let min_stock = input.min_stock.unwrap_or(0);
        check("min_stock", shared::validate_min_stock(min_stock))?;
        let unit = non_blank(input.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string());

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (code, name, category, unit, description, min_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&code)
        .bind(input.name.trim())
        .bind(non_blank(input.category))
        .bind(&unit)
        .bind(non_blank(input.description))
        .bind(min_stock)
        .fetch_one(&mut *conn)
        .await?;

        Ok(item)
    }

    pub async fn update(&self, id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        let code = input.code.map(|c| c.trim().to_string());
        if let Some(code) = &code {
            check("code", shared::validate_code(code))?;
        }
        if let Some(name) = &input.name {
            check("name", shared::validate_name(name))?;
        }
        if let Some(min_stock) = input.min_stock {
            check("min_stock", shared::validate_min_stock(min_stock))?;
        }

        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                unit = COALESCE($5, unit),
                description = COALESCE($6, description),
                min_stock = COALESCE($7, min_stock)
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(code)
        .bind(input.name.as_deref().map(str::trim))
        .bind(non_blank(input.category))
        .bind(non_blank(input.unit))
        .bind(non_blank(input.description))
        .bind(input.min_stock)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Delete an item that has no movements and no stock on hand
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM inbound_lines WHERE item_id = $1)
                OR EXISTS (SELECT 1 FROM outbound_lines WHERE item_id = $1)
                OR EXISTS (SELECT 1 FROM transfer_lines WHERE item_id = $1)
                OR EXISTS (SELECT 1 FROM stock_count_lines WHERE item_id = $1)
                OR EXISTS (SELECT 1 FROM warehouse_stocks WHERE item_id = $1 AND quantity <> 0)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::in_use("Item"));
        }

        sqlx::query("DELETE FROM warehouse_stocks WHERE item_id = $1 AND quantity = 0")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(item_id = %id, "Deleted item");
        Ok(())
    }

    /// Ensure every referenced item exists, as a 404 for the first missing one
    pub(crate) async fn ensure_exist(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<()> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        require_all(ids, &found)
    }

    /// Lower-cased codes that already exist
    pub(crate) async fn existing_codes(conn: &mut PgConnection) -> AppResult<Vec<(Uuid, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, LOWER(code) FROM items")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }
}

/// First requested id absent from `found`, in request order
fn first_missing(requested: &[Uuid], found: &[Uuid]) -> Option<Uuid> {
    requested.iter().find(|id| !found.contains(id)).copied()
}

fn require_all(requested: &[Uuid], found: &[Uuid]) -> AppResult<()> {
    match first_missing(requested, found) {
        Some(missing) => Err(AppError::NotFound(format!("Item {}", missing))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_missing_reports_in_request_order() {
        let known = Uuid::new_v4();
        let gone_a = Uuid::new_v4();
        let gone_b = Uuid::new_v4();

        assert_eq!(first_missing(&[known, gone_a, gone_b], &[known]), Some(gone_a));
        assert_eq!(first_missing(&[known, known], &[known]), None);
        assert_eq!(first_missing(&[], &[known]), None);
    }

    #[test]
    fn test_unknown_item_is_not_found() {
        let known = Uuid::new_v4();
        let gone = Uuid::new_v4();

        match require_all(&[known, gone], &[known]) {
            Err(AppError::NotFound(what)) => assert_eq!(what, format!("Item {}", gone)),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(require_all(&[known], &[known]).is_ok());
    }
}
