use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Organizer,
    Admin,
}

impl Role {
    pub fn can_manage_events(self) -> bool {
        matches!(self, Role::Organizer | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
    pub is_current: bool,
}

/// Access tier of the caller. `role` is `None` for anonymous callers, which is
/// distinct from an authenticated user holding the default `user` role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    pub role: Option<Role>,
    pub can_manage_events: bool,
    pub is_admin: bool,
}

impl RoleInfo {
    pub fn anonymous() -> Self {
        Self {
            role: None,
            can_manage_events: false,
            is_admin: false,
        }
    }

    pub fn for_role(role: Role) -> Self {
        Self {
            role: Some(role),
            can_manage_events: role.can_manage_events(),
            is_admin: role.is_admin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}
