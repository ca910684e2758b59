//! User roles for the inventory UI and API

use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

/// Role assigned to a user account
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    DeriveActiveEnum,
    EnumIter,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserRole {
    /// Read-only access
    #[default]
    #[sea_orm(string_value = "Viewer")]
    Viewer,

    /// Can create and modify inventory records
    #[sea_orm(string_value = "Editor")]
    Editor,

    /// Full access including user management
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Viewer => "Viewer",
            UserRole::Editor => "Editor",
            UserRole::Admin => "Admin",
        }
    }

    /// Whether this role may mutate inventory records
    pub fn can_edit(&self) -> bool {
        matches!(self, UserRole::Editor | UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
