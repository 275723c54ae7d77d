use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::auth::credentials::{hash_password, CredentialStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewAccount, NewClient, PermissionGrant};
use crate::database::store::AccessStore;
use crate::types::{resource, role};

/// Demo users as (username, password, roles)
pub const DEMO_USERS: &[(&str, &str, &[&str])] = &[
    ("admin", "admin123", &[role::ADMIN]),
    ("testuser", "testpass123", &[role::PORTFOLIO_MANAGER]),
];

/// Demo grants as (role, resource, can_read, can_write)
pub const DEMO_PERMISSIONS: &[(&str, &str, bool, bool)] = &[
    (role::ADMIN, resource::CLIENTS, true, true),
    (role::ADMIN, resource::ACCOUNTS, true, true),
    (role::ADMIN, resource::PERMISSIONS, true, true),
    (role::ADMIN, resource::PAYLOADS, true, true),
    (role::PORTFOLIO_MANAGER, resource::CLIENTS, true, false),
    (role::PORTFOLIO_MANAGER, resource::ACCOUNTS, true, false),
    (role::PORTFOLIO_MANAGER, resource::PAYLOADS, true, true),
];

/// Load the demo clients, accounts, permissions and users.
///
/// Skipped when any client already exists, so restarts keep their data.
/// Returns whether anything was written.
pub async fn seed_demo_data(
    store: &dyn AccessStore,
    credentials: &dyn CredentialStore,
    bcrypt_cost: u32,
) -> Result<bool> {
    if !store.list_clients().await?.is_empty() {
        info!("Clients table already populated, skipping demo seed");
        return Ok(false);
    }

    let global = store
        .insert_client(&NewClient {
            display_name: "Global Corp Inc.".to_string(),
            status: "Active".to_string(),
        })
        .await?;
    store
        .insert_client(&NewClient {
            display_name: "Tech Innovators LLC".to_string(),
            status: "Active".to_string(),
        })
        .await?;

    for (external_ref, cents) in [(Some("F12345"), 15_000_075_i64), (None, 2_500_050_i64)] {
        store
            .insert_account(&NewAccount {
                client_id: global.id,
                external_ref: external_ref.map(str::to_string),
                market_value: Decimal::new(cents, 2),
                status: "Open".to_string(),
            })
            .await?
            .context("demo client vanished while seeding accounts")?;
    }

    for (role_name, resource_name, can_read, can_write) in DEMO_PERMISSIONS {
        store
            .upsert_permission(&PermissionGrant {
                role_name: role_name.to_string(),
                resource_name: resource_name.to_string(),
                can_read: *can_read,
                can_write: *can_write,
            })
            .await?;
    }

    for (username, password, roles) in DEMO_USERS {
        let hash = hash_password(password, bcrypt_cost)
            .with_context(|| format!("failed to hash password for {}", username))?;
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        match credentials.insert_user(username, &hash, &roles).await {
            Ok(_) => {}
            Err(DatabaseError::Conflict(msg)) => warn!("Keeping existing demo user: {}", msg),
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeded demo clients, accounts, permissions and users");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        assert!(seed_demo_data(&store, &store, 4).await.unwrap());
        assert!(!seed_demo_data(&store, &store, 4).await.unwrap());

        assert_eq!(store.list_clients().await.unwrap().len(), 2);
        assert_eq!(store.list_accounts(None).await.unwrap().len(), 2);
        assert_eq!(store.list_permissions(None).await.unwrap().len(), DEMO_PERMISSIONS.len());

        let admin = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.roles, vec!["admin".to_string()]);
    }
}
