//! Role-to-capability derivation.
//!
//! The permission set is a denormalized bundle of booleans derived from a
//! user's role. It exists for UI gating and caching only; the rule engine
//! re-validates every operation independently.

use crate::domain::Role;
use serde::{Deserialize, Serialize};

/// Capability set derived from a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_create_articles: bool,
    pub can_manage_users: bool,
    pub can_access_admin: bool,
    pub can_edit_any_article: bool,
    pub can_delete_articles: bool,
    pub can_approve_writers: bool,
    pub can_view_analytics: bool,
}

impl PermissionSet {
    /// All capabilities granted
    pub fn all() -> Self {
        Self {
            can_create_articles: true,
            can_manage_users: true,
            can_access_admin: true,
            can_edit_any_article: true,
            can_delete_articles: true,
            can_approve_writers: true,
            can_view_analytics: true,
        }
    }

    /// No capabilities granted
    pub fn none() -> Self {
        Self::default()
    }

    /// Derived from the permission set, not the raw role
    pub fn is_admin(&self) -> bool {
        self.can_access_admin
    }

    /// Defined as "can create articles but cannot access admin". Equivalent
    /// to `role == infowriter` only while no other role combines those two.
    pub fn is_infowriter(&self) -> bool {
        self.can_create_articles && !self.can_access_admin
    }
}

/// Derive the capability set for a role. Total and deterministic.
pub fn derive(role: Role) -> PermissionSet {
    match role {
        Role::Admin => PermissionSet::all(),
        Role::Infowriter => PermissionSet {
            can_create_articles: true,
            ..PermissionSet::none()
        },
        Role::User => PermissionSet::none(),
    }
}

/// The one flag that compares the role directly instead of going through
/// the derived set.
pub fn is_user(role: Role) -> bool {
    role == Role::User
}
