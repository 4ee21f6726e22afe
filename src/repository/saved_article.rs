//! Saved-article repository

use crate::domain::SavedArticle;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SavedArticleRepository: Send + Sync {
    /// Insert a bookmark; saving an already-saved article refreshes `saved_at`
    async fn save(&self, id: &str, user_id: &str, article_id: &str) -> Result<SavedArticle>;
    async fn find_by_id(&self, id: &str) -> Result<Option<SavedArticle>>;
    /// `user_id = None` lists every bookmark (admin scope)
    async fn list<'a>(&self, user_id: Option<&'a str>, offset: i64, limit: i64)
        -> Result<Vec<SavedArticle>>;
    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64>;
    async fn delete(&self, id: &str) -> Result<()>;
}

const SAVED_COLUMNS: &str = "id, user_id, article_id, saved_at";

pub struct SavedArticleRepositoryImpl {
    pool: MySqlPool,
}

impl SavedArticleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SavedArticleRepository for SavedArticleRepositoryImpl {
    async fn save(&self, id: &str, user_id: &str, article_id: &str) -> Result<SavedArticle> {
        sqlx::query(
            r#"
            INSERT INTO saved_articles (id, user_id, article_id, saved_at)
            VALUES (?, ?, ?, NOW())
            ON DUPLICATE KEY UPDATE saved_at = NOW()
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to save article")))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SavedArticle>> {
        let saved = sqlx::query_as::<_, SavedArticle>(&format!(
            "SELECT {} FROM saved_articles WHERE id = ?",
            SAVED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn list<'a>(
        &self,
        user_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SavedArticle>> {
        let saved = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, SavedArticle>(&format!(
                    "SELECT {} FROM saved_articles WHERE user_id = ? \
                     ORDER BY saved_at DESC LIMIT ? OFFSET ?",
                    SAVED_COLUMNS
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SavedArticle>(&format!(
                    "SELECT {} FROM saved_articles ORDER BY saved_at DESC LIMIT ? OFFSET ?",
                    SAVED_COLUMNS
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(saved)
    }

    async fn count<'a>(&self, user_id: Option<&'a str>) -> Result<i64> {
        let row: (i64,) = match user_id {
            Some(user_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM saved_articles WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM saved_articles")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM saved_articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Bookmark {} not found", id)));
        }

        Ok(())
    }
}
