//! User profile domain models
//!
//! The `role` field is the sole authorization signal for the whole system.
//! Non-role fields are mutable by the profile owner; `role` only by an admin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// Role of a user, the single axis of authorization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Infowriter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Infowriter => "infowriter",
            Role::Admin => "admin",
        }
    }

    /// Parse a role string; unknown values map to None
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "infowriter" => Some(Role::Infowriter),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile entity
///
/// The document id equals the `uid` issued by the authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub profile_picture: Option<String>,
    /// Legacy flag, superseded by writer_requests rows
    pub requested_writer_access: bool,
    /// Roles held before a demotion, most recent last
    pub previous_roles: Json<Vec<Role>>,
    pub privileges_removed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            uid: String::new(),
            email: String::new(),
            display_name: None,
            role: Role::User,
            profile_picture: None,
            requested_writer_access: false,
            previous_roles: Json(vec![]),
            privileges_removed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a user profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub uid: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Input for updating a user profile
///
/// `role` is only honored for admin callers; the rule engine rejects a
/// self-update whose proposed role differs from the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<Role>,
    pub requested_writer_access: Option<bool>,
}
