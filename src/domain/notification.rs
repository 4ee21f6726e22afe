//! Notification domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Notification entity, owned by the target user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: String::new(),
            title: String::new(),
            body: String::new(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotificationInput {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub body: String,
}
