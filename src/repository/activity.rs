//! User activity repository. The log is append-only, so no update or
//! delete statements live here.

use crate::domain::{RecordActivityInput, UserActivity};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create(&self, id: &str, user_id: &str, input: &RecordActivityInput)
        -> Result<UserActivity>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserActivity>>;
    async fn list<'a>(&self, user_id: Option<&'a str>, offset: i64, limit: i64)
        -> Result<Vec<UserActivity>>;
    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64>;
}

const ACTIVITY_COLUMNS: &str = "id, user_id, action, target_id, created_at";

pub struct ActivityRepositoryImpl {
    pool: MySqlPool,
}

impl ActivityRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for ActivityRepositoryImpl {
    async fn create(
        &self,
        id: &str,
        user_id: &str,
        input: &RecordActivityInput,
    ) -> Result<UserActivity> {
        sqlx::query(
            r#"
            INSERT INTO user_activity (id, user_id, action, target_id, created_at)
            VALUES (?, ?, ?, ?, NOW())
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.action)
        .bind(&input.target_id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to record activity")))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserActivity>> {
        let activity = sqlx::query_as::<_, UserActivity>(&format!(
            "SELECT {} FROM user_activity WHERE id = ?",
            ACTIVITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(activity)
    }

    async fn list<'a>(
        &self,
        user_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<UserActivity>> {
        let activities = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, UserActivity>(&format!(
                    "SELECT {} FROM user_activity WHERE user_id = ? \
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    ACTIVITY_COLUMNS
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserActivity>(&format!(
                    "SELECT {} FROM user_activity ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    ACTIVITY_COLUMNS
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(activities)
    }

    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64> {
        let row: (i64,) = match user_id {
            Some(user_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM user_activity WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM user_activity")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }
}
