//! Saved-article (bookmark) domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bookmark linking a user to an article.
///
/// The document id is the compound `{user_id}_{article_id}`, which lets the
/// rule engine resolve ownership from the id alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedArticle {
    pub id: String,
    pub user_id: String,
    pub article_id: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedArticle {
    /// Build the compound document id for a bookmark
    pub fn compound_id(user_id: &str, article_id: &str) -> String {
        format!("{}_{}", user_id, article_id)
    }
}

impl Default for SavedArticle {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            article_id: String::new(),
            saved_at: Utc::now(),
        }
    }
}
