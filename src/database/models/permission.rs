use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A role's access to one resource; unique per (role_name, resource_name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub role_name: String,
    pub resource_name: String,
    pub can_read: bool,
    pub can_write: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub role_name: String,
    pub resource_name: String,
    pub can_read: bool,
    pub can_write: bool,
}
