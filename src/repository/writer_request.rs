//! Writer request repository

use crate::domain::{CreateWriterRequestInput, WriterRequest, WriterRequestStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WriterRequestRepository: Send + Sync {
    async fn create(&self, id: &str, input: &CreateWriterRequestInput) -> Result<WriterRequest>;
    async fn find_by_id(&self, id: &str) -> Result<Option<WriterRequest>>;
    /// `user_id = None` lists every request (admin scope)
    async fn list<'a>(&self, user_id: Option<&'a str>, offset: i64, limit: i64)
        -> Result<Vec<WriterRequest>>;
    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64>;
    async fn find_pending_for_user(&self, user_id: &str) -> Result<Option<WriterRequest>>;
    async fn set_status(
        &self,
        id: &str,
        status: WriterRequestStatus,
        reviewed_by: &str,
        reviewed_at: DateTime<Utc>,
    ) -> Result<WriterRequest>;
    async fn delete(&self, id: &str) -> Result<()>;
}

const REQUEST_COLUMNS: &str =
    "id, user_id, status, message, created_at, reviewed_at, reviewed_by";

pub struct WriterRequestRepositoryImpl {
    pool: MySqlPool,
}

impl WriterRequestRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WriterRequestRepository for WriterRequestRepositoryImpl {
    async fn create(&self, id: &str, input: &CreateWriterRequestInput) -> Result<WriterRequest> {
        sqlx::query(
            r#"
            INSERT INTO writer_requests (id, user_id, status, message, created_at)
            VALUES (?, ?, 'pending', ?, NOW())
            "#,
        )
        .bind(id)
        .bind(&input.user_id)
        .bind(&input.message)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create writer request")))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WriterRequest>> {
        let request = sqlx::query_as::<_, WriterRequest>(&format!(
            "SELECT {} FROM writer_requests WHERE id = ?",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list<'a>(
        &self,
        user_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<WriterRequest>> {
        let requests = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, WriterRequest>(&format!(
                    "SELECT {} FROM writer_requests WHERE user_id = ? \
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    REQUEST_COLUMNS
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WriterRequest>(&format!(
                    "SELECT {} FROM writer_requests ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    REQUEST_COLUMNS
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(requests)
    }

    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64> {
        let row: (i64,) = match user_id {
            Some(user_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM writer_requests WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM writer_requests")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }

    async fn find_pending_for_user(&self, user_id: &str) -> Result<Option<WriterRequest>> {
        let request = sqlx::query_as::<_, WriterRequest>(&format!(
            "SELECT {} FROM writer_requests WHERE user_id = ? AND status = 'pending'",
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn set_status(
        &self,
        id: &str,
        status: WriterRequestStatus,
        reviewed_by: &str,
        reviewed_at: DateTime<Utc>,
    ) -> Result<WriterRequest> {
        let result = sqlx::query(
            r#"
            UPDATE writer_requests
            SET status = ?, reviewed_by = ?, reviewed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(reviewed_by)
        .bind(reviewed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Writer request {} not found",
                id
            )));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update writer request")))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM writer_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Writer request {} not found",
                id
            )));
        }

        Ok(())
    }
}
