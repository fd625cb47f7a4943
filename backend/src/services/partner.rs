//! Suppliers (pemasok) and customers (pelanggan)
//!
//! Both share one shape and one service, parameterized by [`PartnerKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{check, like_pattern, non_blank, SearchQuery};
use shared::types::PaginatedResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerKind {
    Supplier,
    Customer,
}

impl PartnerKind {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            PartnerKind::Supplier => "suppliers",
            PartnerKind::Customer => "customers",
        }
    }

    /// Movement header column that references this kind
    fn reference(&self) -> (&'static str, &'static str) {
        match self {
            PartnerKind::Supplier => ("inbound_transactions", "supplier_id"),
            PartnerKind::Customer => ("outbound_transactions", "customer_id"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartnerKind::Supplier => "Supplier",
            PartnerKind::Customer => "Customer",
        }
    }
}

#[derive(Clone)]
pub struct PartnerService {
    db: PgPool,
    kind: PartnerKind,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartnerInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePartnerInput {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

const PARTNER_COLUMNS: &str =
    "id, name, contact_person, phone, email, address, notes, created_at, updated_at";

fn validate_contact(phone: Option<&str>, email: Option<&str>) -> AppResult<()> {
    if let Some(phone) = phone {
        check("phone", shared::validate_indonesian_phone(phone))?;
    }
    if let Some(email) = email {
        check("email", shared::validate_email(email))?;
    }
    Ok(())
}

impl PartnerService {
    pub fn new(db: PgPool, kind: PartnerKind) -> Self {
        Self { db, kind }
    }

    fn not_found(&self) -> AppError {
        AppError::NotFound(self.kind.label().to_string())
    }

    pub async fn list(&self, query: &SearchQuery) -> AppResult<PaginatedResponse<Partner>> {
        let pagination = query.pagination();
        let pattern = like_pattern(query.q.as_deref());
        let filter = "($1::text IS NULL OR name ILIKE $1 OR contact_person ILIKE $1 OR phone ILIKE $1)";

        let partners = sqlx::query_as::<_, Partner>(&format!(
            "SELECT {} FROM {} WHERE {} ORDER BY name LIMIT $2 OFFSET $3",
            PARTNER_COLUMNS,
            self.kind.table(),
            filter
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.kind.table(),
            filter
        ))
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse::new(partners, pagination, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Partner> {
        sqlx::query_as::<_, Partner>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            PARTNER_COLUMNS,
            self.kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| self.not_found())
    }

    pub async fn create(&self, input: PartnerInput) -> AppResult<Partner> {
        let mut conn = self.db.acquire().await?;
        let partner = Self::insert(&mut conn, self.kind, input).await?;
        tracing::info!(kind = self.kind.label(), name = %partner.name, "Created partner");
        Ok(partner)
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        kind: PartnerKind,
        input: PartnerInput,
    ) -> AppResult<Partner> {
        check("name", shared::validate_name(&input.name))?;
        let phone = non_blank(input.phone);
        let email = non_blank(input.email);
        validate_contact(phone.as_deref(), email.as_deref())?;

        let partner = sqlx::query_as::<_, Partner>(&format!(
            r#"
            INSERT INTO {} (name, contact_person, phone, email, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            kind.table(),
            PARTNER_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(non_blank(input.contact_person))
        .bind(phone)
        .bind(email)
        .bind(non_blank(input.address))
        .bind(non_blank(input.notes))
        .fetch_one(&mut *conn)
        .await?;

        Ok(partner)
    }

    pub async fn update(&self, id: Uuid, input: UpdatePartnerInput) -> AppResult<Partner> {
        if let Some(name) = &input.name {
            check("name", shared::validate_name(name))?;
        }
        let phone = non_blank(input.phone);
        let email = non_blank(input.email);
        validate_contact(phone.as_deref(), email.as_deref())?;

        sqlx::query_as::<_, Partner>(&format!(
            r#"
            UPDATE {} SET
                name = COALESCE($2, name),
                contact_person = COALESCE($3, contact_person),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                address = COALESCE($6, address),
                notes = COALESCE($7, notes)
            WHERE id = $1
            RETURNING {}
            "#,
            self.kind.table(),
            PARTNER_COLUMNS
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(non_blank(input.contact_person))
        .bind(phone)
        .bind(email)
        .bind(non_blank(input.address))
        .bind(non_blank(input.notes))
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| self.not_found())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let (table, column) = self.kind.reference();
        let referenced = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            table, column
        ))
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        if referenced {
            return Err(AppError::in_use(self.kind.label()));
        }

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(self.not_found());
        }

        tracing::info!(kind = self.kind.label(), partner_id = %id, "Deleted partner");
        Ok(())
    }

    /// Lower-cased names that already exist
    pub(crate) async fn existing_names(
        conn: &mut PgConnection,
        kind: PartnerKind,
    ) -> AppResult<Vec<(Uuid, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(&format!(
            "SELECT id, LOWER(name) FROM {}",
            kind.table()
        ))
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Ensure the partner exists, as a 404 for the referenced resource
    pub(crate) async fn ensure_exists(
        conn: &mut PgConnection,
        kind: PartnerKind,
        id: Uuid,
    ) -> AppResult<()> {
        let found = sqlx::query_scalar::<_, i32>(&format!(
            "SELECT 1 FROM {} WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        found
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(kind.label().to_string()))
    }
}
