use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use crate::auth::credentials::CredentialStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Account, Client, ClientAccountRow, ClientDetail, NewAccount, NewClient, Payload, Permission,
    PermissionGrant, UserCredential,
};
use crate::database::store::AccessStore;
use crate::types::AccessMode;

#[derive(Default)]
struct Tables {
    clients: BTreeMap<i64, Client>,
    accounts: BTreeMap<i64, Account>,
    /// Keyed by (role, resource) so each pair has at most one row
    permissions: BTreeMap<(String, String), Permission>,
    users: BTreeMap<String, UserCredential>,
    payloads: BTreeMap<i64, Payload>,
    next_client_id: i64,
    next_account_id: i64,
    next_permission_id: i64,
    next_user_id: i64,
    next_payload_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn clients_above(&self, threshold: Decimal) -> Vec<Client> {
        let owners: BTreeSet<i64> = self
            .accounts
            .values()
            .filter(|a| a.market_value > threshold)
            .map(|a| a.client_id)
            .collect();
        owners
            .iter()
            .filter_map(|id| self.clients.get(id).cloned())
            .collect()
    }
}

/// In-process store with the same relational contract as the PostgreSQL one.
/// Used by the `memory` storage backend and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn has_permission(
        &self,
        roles: &[String],
        resource: &str,
        mode: AccessMode,
    ) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        let allowed = roles.iter().any(|role| {
            tables
                .permissions
                .get(&(role.clone(), resource.to_string()))
                .map(|p| match mode {
                    AccessMode::Read => p.can_read,
                    AccessMode::Write => p.can_write,
                })
                .unwrap_or(false)
        });
        Ok(allowed)
    }

    async fn list_permissions(&self, mode: Option<AccessMode>) -> Result<Vec<Permission>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables
            .permissions
            .values()
            .filter(|p| match mode {
                Some(AccessMode::Read) => p.can_read,
                Some(AccessMode::Write) => p.can_write,
                None => true,
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn upsert_permission(&self, grant: &PermissionGrant) -> Result<Permission, DatabaseError> {
        let mut tables = self.tables.write().await;
        let key = (grant.role_name.clone(), grant.resource_name.clone());

        let existing_id = tables.permissions.get(&key).map(|p| p.id);
        let id = match existing_id {
            Some(id) => id,
            None => Tables::next_id(&mut tables.next_permission_id),
        };
        let permission = Permission {
            id,
            role_name: grant.role_name.clone(),
            resource_name: grant.resource_name.clone(),
            can_read: grant.can_read,
            can_write: grant.can_write,
        };
        tables.permissions.insert(key, permission.clone());
        Ok(permission)
    }

    async fn list_clients(&self) -> Result<Vec<Client>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.values().cloned().collect())
    }

    async fn find_client(&self, id: i64) -> Result<Option<Client>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.get(&id).cloned())
    }

    async fn insert_client(&self, client: &NewClient) -> Result<Client, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = Tables::next_id(&mut tables.next_client_id);
        let created = Client {
            id,
            display_name: client.display_name.clone(),
            status: client.status.clone(),
            created_at: Utc::now(),
        };
        tables.clients.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_client(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.clients.remove(&id).is_none() {
            return Ok(false);
        }
        tables.accounts.retain(|_, account| account.client_id != id);
        Ok(true)
    }

    async fn client_detail(
        &self,
        id: i64,
        high_value_threshold: Decimal,
    ) -> Result<Option<ClientDetail>, DatabaseError> {
        let tables = self.tables.read().await;
        let Some(client) = tables.clients.get(&id) else {
            return Ok(None);
        };

        let (linked, unlinked): (Vec<&Account>, Vec<&Account>) = tables
            .accounts
            .values()
            .filter(|a| a.client_id == id)
            .partition(|a| a.external_ref.is_some());

        Ok(Some(ClientDetail {
            display_name: client.display_name.clone(),
            unlinked_account_count: unlinked.len() as i64,
            linked_account_count: linked.len() as i64,
            high_value_peer_client_count: tables.clients_above(high_value_threshold).len() as i64,
        }))
    }

    async fn clients_above(&self, threshold: Decimal) -> Result<Vec<Client>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.clients_above(threshold))
    }

    async fn client_accounts(&self, client_id: i64) -> Result<Option<Vec<ClientAccountRow>>, DatabaseError> {
        let tables = self.tables.read().await;
        let Some(client) = tables.clients.get(&client_id) else {
            return Ok(None);
        };

        let rows = tables
            .accounts
            .values()
            .filter(|a| a.client_id == client_id)
            .map(|a| ClientAccountRow {
                client_id: client.id,
                display_name: client.display_name.clone(),
                account_id: a.id,
                external_ref: a.external_ref.clone(),
            })
            .collect();
        Ok(Some(rows))
    }

    async fn list_accounts(&self, client_id: Option<i64>) -> Result<Vec<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .filter(|a| client_id.map_or(true, |id| a.client_id == id))
            .cloned()
            .collect())
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Option<Account>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.clients.contains_key(&account.client_id) {
            return Ok(None);
        }

        let id = Tables::next_id(&mut tables.next_account_id);
        let created = Account {
            id,
            client_id: account.client_id,
            external_ref: account.external_ref.clone(),
            market_value: account.market_value,
            status: account.status.clone(),
        };
        tables.accounts.insert(id, created.clone());
        Ok(Some(created))
    }

    async fn delete_account(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.accounts.remove(&id).is_some())
    }

    async fn insert_payload(&self, data: &str) -> Result<Payload, DatabaseError> {
        let mut tables = self.tables.write().await;
        let payload = Payload {
            id: Tables::next_id(&mut tables.next_payload_id),
            data: data.to_string(),
            created_at: Utc::now(),
        };
        tables.payloads.insert(payload.id, payload.clone());
        Ok(payload)
    }

    async fn list_payloads(&self) -> Result<Vec<Payload>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.payloads.values().rev().cloned().collect())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserCredential>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(username).cloned())
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<UserCredential, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(username) {
            return Err(DatabaseError::Conflict(format!("user '{}' already exists", username)));
        }

        let roles: BTreeSet<String> = roles.iter().cloned().collect();
        let user = UserCredential {
            id: Tables::next_id(&mut tables.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            roles: roles.into_iter().collect(),
        };
        tables.users.insert(username.to_string(), user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    async fn store_with_client() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let client = store
            .insert_client(&NewClient {
                display_name: "Global Corp Inc.".to_string(),
                status: "Active".to_string(),
            })
            .await
            .unwrap();
        (store, client.id)
    }

    fn account(client_id: i64, external_ref: Option<&str>, value: &str) -> NewAccount {
        NewAccount {
            client_id,
            external_ref: external_ref.map(str::to_string),
            market_value: Decimal::from_str(value).unwrap(),
            status: "Open".to_string(),
        }
    }

    #[tokio::test]
    async fn deleting_client_cascades_to_accounts() {
        let (store, client_id) = store_with_client().await;
        store.insert_account(&account(client_id, Some("F12345"), "10.00")).await.unwrap();
        store.insert_account(&account(client_id, None, "20.00")).await.unwrap();

        assert!(store.delete_client(client_id).await.unwrap());
        assert!(store.list_accounts(Some(client_id)).await.unwrap().is_empty());
        assert!(store.list_accounts(None).await.unwrap().is_empty());
        assert!(!store.delete_client(client_id).await.unwrap());
    }

    #[tokio::test]
    async fn account_insert_requires_existing_client() {
        let store = MemoryStore::new();
        let created = store.insert_account(&account(42, None, "1.00")).await.unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_pair() {
        let store = MemoryStore::new();
        let grant = PermissionGrant {
            role_name: "admin".to_string(),
            resource_name: "ClientsViewSet".to_string(),
            can_read: true,
            can_write: false,
        };
        let first = store.upsert_permission(&grant).await.unwrap();
        let second = store
            .upsert_permission(&PermissionGrant { can_write: true, ..grant })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let rows = store.list_permissions(None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].can_write);
    }

    #[tokio::test]
    async fn payloads_come_back_newest_first() {
        let store = MemoryStore::new();
        store.insert_payload("hello").await.unwrap();
        store.insert_payload("world").await.unwrap();

        let ids: Vec<i64> = store.list_payloads().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.insert_user("admin", "hash", &["admin".to_string()]).await.unwrap();
        let err = store.insert_user("admin", "hash", &[]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }
}
