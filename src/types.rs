/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access modes a permission row can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    /// Permission column holding the flag for this mode
    pub fn column(self) -> &'static str {
        match self {
            AccessMode::Read => "can_read",
            AccessMode::Write => "can_write",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "r" => Ok(AccessMode::Read),
            "write" | "w" => Ok(AccessMode::Write),
            other => Err(format!("unknown access mode '{}', expected read or write", other)),
        }
    }
}

/// Names of the protected resources checked by the API
pub mod resource {
    pub const CLIENTS: &str = "ClientsViewSet";
    pub const ACCOUNTS: &str = "AccountsViewSet";
    pub const PERMISSIONS: &str = "PermissionsAdmin";
    pub const PAYLOADS: &str = "PayloadsViewSet";
}

/// Role names created by the demo fixture
pub mod role {
    pub const ADMIN: &str = "admin";
    pub const PORTFOLIO_MANAGER: &str = "portfolio_manager";
}
