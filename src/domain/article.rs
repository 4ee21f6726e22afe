//! Article domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// Publication status of an article
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }
}

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: String,
    /// uid of the creator; immutable after create
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub category: Option<String>,
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Article {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: String::new(),
            title: String::new(),
            content: String::new(),
            status: ArticleStatus::Draft,
            category: None,
            tags: Json(vec![]),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating an article
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateArticleInput {
    /// Must equal the caller's uid; enforced by the rule engine
    #[validate(length(min = 1, max = 128))]
    pub author_id: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: ArticleStatus,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating an article
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateArticleInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ArticleStatus>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Filters for listing articles
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author_id: Option<String>,
}
