//! Writer request domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Review state of a writer request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WriterRequestStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

/// A user's request for infowriter privileges
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WriterRequest {
    pub id: String,
    pub user_id: String,
    pub status: WriterRequestStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// uid of the admin who approved or denied
    pub reviewed_by: Option<String>,
}

impl Default for WriterRequest {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: String::new(),
            status: WriterRequestStatus::Pending,
            message: None,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }
}

/// Input for creating a writer request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateWriterRequestInput {
    /// Must equal the caller's uid; enforced by the rule engine
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}
