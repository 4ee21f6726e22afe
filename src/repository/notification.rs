//! Notification repository

use crate::domain::{CreateNotificationInput, Notification};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, id: &str, input: &CreateNotificationInput) -> Result<Notification>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>>;
    /// `user_id = None` lists every notification (admin read-all)
    async fn list<'a>(&self, user_id: Option<&'a str>, offset: i64, limit: i64)
        -> Result<Vec<Notification>>;
    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64>;
    async fn mark_read(&self, id: &str) -> Result<Notification>;
    async fn delete(&self, id: &str) -> Result<()>;
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, body, is_read, created_at";

pub struct NotificationRepositoryImpl {
    pool: MySqlPool,
}

impl NotificationRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn create(&self, id: &str, input: &CreateNotificationInput) -> Result<Notification> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, body, is_read, created_at)
            VALUES (?, ?, ?, ?, false, NOW())
            "#,
        )
        .bind(id)
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(&input.body)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create notification")))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = ?",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list<'a>(
        &self,
        user_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, Notification>(&format!(
                    "SELECT {} FROM notifications WHERE user_id = ? \
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    NOTIFICATION_COLUMNS
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Notification>(&format!(
                    "SELECT {} FROM notifications ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    NOTIFICATION_COLUMNS
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(notifications)
    }

    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64> {
        let row: (i64,) = match user_id {
            Some(user_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM notifications")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }

    async fn mark_read(&self, id: &str) -> Result<Notification> {
        let result = sqlx::query("UPDATE notifications SET is_read = true WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update notification")))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        Ok(())
    }
}
