//! Article repository

use crate::domain::{Article, ArticleFilter, CreateArticleInput, UpdateArticleInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{MySqlPool, QueryBuilder};

/// Row visibility for listing queries.
///
/// The list rule admits any caller and delegates row filtering to the
/// query; the service maps the caller to one of these scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleVisibility {
    /// Anonymous callers: published rows only
    PublishedOnly,
    /// Authenticated non-admins: published rows plus their own
    PublishedOrAuthor(String),
    /// Admins
    All,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn create(&self, id: &str, input: &CreateArticleInput) -> Result<Article>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Article>>;
    async fn list(
        &self,
        visibility: &ArticleVisibility,
        filter: &ArticleFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>>;
    async fn count(&self, visibility: &ArticleVisibility, filter: &ArticleFilter) -> Result<i64>;
    async fn update(&self, id: &str, input: &UpdateArticleInput) -> Result<Article>;
    async fn delete(&self, id: &str) -> Result<()>;
}

const ARTICLE_COLUMNS: &str =
    "id, author_id, title, content, status, category, tags, created_at, updated_at";

pub struct ArticleRepositoryImpl {
    pool: MySqlPool,
}

impl ArticleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn push_filters<'a>(
        builder: &mut QueryBuilder<'a, sqlx::MySql>,
        visibility: &'a ArticleVisibility,
        filter: &'a ArticleFilter,
    ) {
        builder.push(" WHERE 1 = 1");

        match visibility {
            ArticleVisibility::PublishedOnly => {
                builder.push(" AND status = 'published'");
            }
            ArticleVisibility::PublishedOrAuthor(uid) => {
                builder
                    .push(" AND (status = 'published' OR author_id = ")
                    .push_bind(uid.as_str())
                    .push(")");
            }
            ArticleVisibility::All => {}
        }

        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(tag) = &filter.tag {
            builder
                .push(" AND JSON_CONTAINS(tags, JSON_QUOTE(")
                .push_bind(tag.as_str())
                .push("))");
        }
        if let Some(author_id) = &filter.author_id {
            builder
                .push(" AND author_id = ")
                .push_bind(author_id.as_str());
        }
    }
}

#[async_trait]
impl ArticleRepository for ArticleRepositoryImpl {
    async fn create(&self, id: &str, input: &CreateArticleInput) -> Result<Article> {
        sqlx::query(
            r#"
            INSERT INTO articles (id, author_id, title, content, status, category, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.author_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status)
        .bind(&input.category)
        .bind(Json(&input.tags))
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create article")))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles WHERE id = ?",
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    async fn list(
        &self,
        visibility: &ArticleVisibility,
        filter: &ArticleFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM articles", ARTICLE_COLUMNS));
        Self::push_filters(&mut builder, visibility, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;

        Ok(articles)
    }

    async fn count(&self, visibility: &ArticleVisibility, filter: &ArticleFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM articles");
        Self::push_filters(&mut builder, visibility, filter);

        let row: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    async fn update(&self, id: &str, input: &UpdateArticleInput) -> Result<Article> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))?;

        let title = input.title.as_ref().unwrap_or(&existing.title);
        let content = input.content.as_ref().unwrap_or(&existing.content);
        let status = input.status.unwrap_or(existing.status);
        let category = input.category.as_ref().or(existing.category.as_ref());
        let tags = input.tags.as_ref().unwrap_or(&existing.tags.0);

        sqlx::query(
            r#"
            UPDATE articles
            SET title = ?, content = ?, status = ?, category = ?, tags = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(status)
        .bind(category)
        .bind(Json(tags))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update article")))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Article {} not found", id)));
        }

        Ok(())
    }
}
