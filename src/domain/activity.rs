//! User activity domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A recorded user action (page view, article read, search)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivity {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub target_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for UserActivity {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: String::new(),
            action: String::new(),
            target_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Input for recording an activity event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordActivityInput {
    #[validate(length(min = 1, max = 100))]
    pub action: String,
    #[validate(length(max = 128))]
    pub target_id: Option<String>,
}
