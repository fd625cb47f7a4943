//! Shelf codes (kode rak): bin locations inside a warehouse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{check, like_pattern, non_blank, WarehouseService};
use shared::types::{PaginatedResponse, Pagination};

#[derive(Clone)]
pub struct ShelfCodeService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShelfCode {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShelfCodeQuery {
    pub warehouse_id: Option<Uuid>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateShelfCodeInput {
    pub warehouse_id: Uuid,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShelfCodeInput {
    pub code: Option<String>,
    pub description: Option<String>,
}

const SELECT_SHELF_CODE: &str = r#"
    SELECT s.id, s.warehouse_id, w.name AS warehouse_name, s.code, s.description,
           s.created_at, s.updated_at
    FROM shelf_codes s
    JOIN warehouses w ON w.id = s.warehouse_id
"#;

impl ShelfCodeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ShelfCodeQuery) -> AppResult<PaginatedResponse<ShelfCode>> {
        let pagination = Pagination::from_query(query.page, query.per_page);
        let pattern = like_pattern(query.q.as_deref());

        let shelf_codes = sqlx::query_as::<_, ShelfCode>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR s.warehouse_id = $1)
              AND ($2::text IS NULL OR s.code ILIKE $2 OR s.description ILIKE $2)
            ORDER BY w.name, s.code
            LIMIT $3 OFFSET $4
            "#,
            SELECT_SHELF_CODE
        ))
        .bind(query.warehouse_id)
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM shelf_codes s
            WHERE ($1::uuid IS NULL OR s.warehouse_id = $1)
              AND ($2::text IS NULL OR s.code ILIKE $2 OR s.description ILIKE $2)
            "#,
        )
        .bind(query.warehouse_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(shelf_codes, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ShelfCode> {
        let mut conn = self.db.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    async fn fetch(conn: &mut PgConnection, id: Uuid) -> AppResult<ShelfCode> {
        sqlx::query_as::<_, ShelfCode>(&format!("{} WHERE s.id = $1", SELECT_SHELF_CODE))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Shelf code".to_string()))
    }

    pub async fn create(&self, input: CreateShelfCodeInput) -> AppResult<ShelfCode> {
        let code = input.code.trim().to_string();
        check("code", shared::validate_code(&code))?;

        let mut conn = self.db.acquire().await?;
        WarehouseService::ensure_exists(&mut conn, input.warehouse_id).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO shelf_codes (warehouse_id, code, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(input.warehouse_id)
        .bind(&code)
        .bind(non_blank(input.description))
        .fetch_one(&mut *conn)
        .await?;

        Self::fetch(&mut conn, id).await
    }

    pub async fn update(&self, id: Uuid, input: UpdateShelfCodeInput) -> AppResult<ShelfCode> {
        let code = input.code.map(|c| c.trim().to_string());
        if let Some(code) = &code {
            check("code", shared::validate_code(code))?;
        }

        let mut conn = self.db.acquire().await?;
        let updated = sqlx::query(
            r#"
            UPDATE shelf_codes SET
                code = COALESCE($2, code),
                description = COALESCE($3, description)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(non_blank(input.description))
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Shelf code".to_string()));
        }

        Self::fetch(&mut conn, id).await
    }

    /// Delete a shelf code; stock rows and inbound lines lose the reference
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM shelf_codes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shelf code".to_string()));
        }
        Ok(())
    }

    /// Ensure `shelf_code_id` exists and belongs to `warehouse_id`
    pub(crate) async fn ensure_in_warehouse(
        conn: &mut PgConnection,
        shelf_code_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<()> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT warehouse_id FROM shelf_codes WHERE id = $1")
            .bind(shelf_code_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Shelf code".to_string()))?;

        if owner != warehouse_id {
            return Err(AppError::validation(
                "shelf_code_id",
                "Shelf code belongs to a different warehouse",
            ));
        }
        Ok(())
    }
}
