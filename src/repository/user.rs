//! User repository

use crate::domain::{CreateUserInput, Role, UpdateUserInput, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, input: &CreateUserInput) -> Result<User>;
    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    async fn count(&self) -> Result<i64>;
    /// Update non-role profile fields
    async fn update(&self, uid: &str, input: &UpdateUserInput) -> Result<User>;
    /// Change the role; the prior role is appended to `previous_roles` and
    /// `privileges_removed_at` is stamped on demotion
    async fn set_role(
        &self,
        uid: &str,
        role: Role,
        privileges_removed_at: Option<DateTime<Utc>>,
    ) -> Result<User>;
    async fn delete(&self, uid: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "uid, email, display_name, role, profile_picture, \
     requested_writer_access, previous_roles, privileges_removed_at, created_at, updated_at";

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (uid, email, display_name, role, profile_picture,
                               requested_writer_access, previous_roles, created_at, updated_at)
            VALUES (?, ?, ?, 'user', ?, false, '[]', NOW(), NOW())
            "#,
        )
        .bind(&input.uid)
        .bind(&input.email)
        .bind(&input.display_name)
        .bind(&input.profile_picture)
        .execute(&self.pool)
        .await?;

        self.find_by_uid(&input.uid)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE uid = ?",
            USER_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn update(&self, uid: &str, input: &UpdateUserInput) -> Result<User> {
        let existing = self
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

        let display_name = input
            .display_name
            .as_ref()
            .or(existing.display_name.as_ref());
        let profile_picture = input
            .profile_picture
            .as_ref()
            .or(existing.profile_picture.as_ref());
        let requested_writer_access = input
            .requested_writer_access
            .unwrap_or(existing.requested_writer_access);

        sqlx::query(
            r#"
            UPDATE users
            SET display_name = ?, profile_picture = ?, requested_writer_access = ?, updated_at = NOW()
            WHERE uid = ?
            "#,
        )
        .bind(display_name)
        .bind(profile_picture)
        .bind(requested_writer_access)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        self.find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update user")))
    }

    async fn set_role(
        &self,
        uid: &str,
        role: Role,
        privileges_removed_at: Option<DateTime<Utc>>,
    ) -> Result<User> {
        let existing = self
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

        let mut previous_roles = existing.previous_roles.0.clone();
        if existing.role != role {
            previous_roles.push(existing.role);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET role = ?, previous_roles = ?, privileges_removed_at = ?, updated_at = NOW()
            WHERE uid = ?
            "#,
        )
        .bind(role)
        .bind(Json(previous_roles))
        .bind(privileges_removed_at)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        self.find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update user role")))
    }

    async fn delete(&self, uid: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", uid)));
        }

        Ok(())
    }
}
