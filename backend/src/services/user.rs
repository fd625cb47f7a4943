//! User account management (admin only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{auth::hash_password, check};
use shared::models::UserRole;

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// User account without its password hash
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "id, username, name, role, is_active, last_login_at, created_at, updated_at";
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    pub username: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY username",
            User::COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    pub async fn create(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        let username = input.username.trim().to_lowercase();
        check("username", shared::validate_username(&username))?;
        check("password", shared::validate_password(&input.password))?;

        let password_hash = hash_password(&input.password)?;
        let role = input.role.unwrap_or(UserRole::Staff);

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, name, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            User::COLUMNS
        ))
        .bind(&username)
        .bind(input.name.trim())
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(username = %user.username, role = %role, "Created user");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> AppResult<User> {
        input.validate()?;
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                check("password", shared::validate_password(password))?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            RETURNING {}
            "#,
            User::COLUMNS
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.role.map(|r| r.as_str()))
        .bind(input.is_active)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if input.is_active == Some(false) {
            sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
                .bind(id)
                .execute(&self.db)
                .await?;
        }

        Ok(user)
    }

    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> AppResult<()> {
        if actor_id == id {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "You cannot delete your own account".to_string(),
                message_id: "Anda tidak dapat menghapus akun Anda sendiri".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }
}
