//! Warehouse (gudang) master data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{check, like_pattern, non_blank, SearchQuery};
use shared::types::PaginatedResponse;

#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWarehouseInput {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

const WAREHOUSE_COLUMNS: &str = "id, code, name, address, description, created_at, updated_at";

impl WarehouseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &SearchQuery) -> AppResult<PaginatedResponse<Warehouse>> {
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());

        let warehouses = sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            SELECT {} FROM warehouses
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)
            ORDER BY code
            LIMIT $2 OFFSET $3
            "#,
            WAREHOUSE_COLUMNS
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warehouses WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(warehouses, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Warehouse> {
        sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {} FROM warehouses WHERE id = $1",
            WAREHOUSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    pub async fn create(&self, input: CreateWarehouseInput) -> AppResult<Warehouse> {
        let mut conn = self.db.acquire().await?;
        let warehouse = Self::insert(&mut conn, input).await?;
        tracing::info!(code = %warehouse.code, "Created warehouse");
        Ok(warehouse)
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        input: CreateWarehouseInput,
    ) -> AppResult<Warehouse> {
        let code = input.code.trim().to_string();
        check("code", shared::validate_code(&code))?;
        check("name", shared::validate_name(&input.name))?;

        let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
            "INSERT INTO warehouses (code, name, address, description) VALUES ($1, $2, $3, $4) RETURNING {}",
            WAREHOUSE_COLUMNS
        ))
        .bind(&code)
        .bind(input.name.trim())
        .bind(non_blank(input.address))
        .bind(non_blank(input.description))
        .fetch_one(&mut *conn)
        .await?;

        Ok(warehouse)
    }

    pub async fn update(&self, id: Uuid, input: UpdateWarehouseInput) -> AppResult<Warehouse> {
        let code = input.code.map(|c| c.trim().to_string());
        if let Some(code) = &code {
            check("code", shared::validate_code(code))?;
        }
        if let Some(name) = &input.name {
            check("name", shared::validate_name(name))?;
        }

        sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            UPDATE warehouses SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                description = COALESCE($5, description)
            WHERE id = $1
            RETURNING {}
            "#,
            WAREHOUSE_COLUMNS
        ))
        .bind(id)
        .bind(code)
        .bind(input.name.as_deref().map(str::trim))
        .bind(non_blank(input.address))
        .bind(non_blank(input.description))
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// Delete a warehouse with no movements and no stock on hand
    ///
    /// Its empty stock rows and shelf codes go with it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM warehouses WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM inbound_transactions WHERE warehouse_id = $1)
                OR EXISTS (SELECT 1 FROM outbound_transactions WHERE warehouse_id = $1)
                OR EXISTS (SELECT 1 FROM transfers
                           WHERE source_warehouse_id = $1 OR destination_warehouse_id = $1)
                OR EXISTS (SELECT 1 FROM stock_counts WHERE warehouse_id = $1)
                OR EXISTS (SELECT 1 FROM warehouse_stocks WHERE warehouse_id = $1 AND quantity <> 0)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::in_use("Warehouse"));
        }

        sqlx::query("DELETE FROM warehouse_stocks WHERE warehouse_id = $1 AND quantity = 0")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shelf_codes WHERE warehouse_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(warehouse_id = %id, "Deleted warehouse");
        Ok(())
    }

    /// Lower-cased codes that already exist
    pub(crate) async fn existing_codes(conn: &mut PgConnection) -> AppResult<Vec<(Uuid, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, LOWER(code) FROM warehouses")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    /// Find a warehouse by code or name, case-insensitively
    pub(crate) async fn find_by_code_or_name(
        conn: &mut PgConnection,
        key: &str,
    ) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM warehouses
            WHERE LOWER(code) = LOWER($1) OR LOWER(name) = LOWER($1)
            ORDER BY (LOWER(code) = LOWER($1)) DESC
            LIMIT 1
            "#,
        )
        .bind(key.trim())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Ensure the warehouse exists, as a 404 for the referenced resource
    pub(crate) async fn ensure_exists(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        let found = sqlx::query_scalar::<_, i32>("SELECT 1 FROM warehouses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }
}
