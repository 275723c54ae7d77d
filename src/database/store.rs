use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Account, Client, ClientAccountRow, ClientDetail, NewAccount, NewClient, Payload, Permission,
    PermissionGrant,
};
use crate::types::AccessMode;

/// Relational operations behind the access-controlled query service.
///
/// Methods returning `Option` yield `None` when the referenced client or
/// account does not exist; callers decide whether that is an error.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Round-trip to the backing store
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// True iff any of `roles` has a permission row on `resource` granting `mode`
    async fn has_permission(
        &self,
        roles: &[String],
        resource: &str,
        mode: AccessMode,
    ) -> Result<bool, DatabaseError>;

    /// Permission rows ordered by role then resource, optionally only those granting `mode`
    async fn list_permissions(&self, mode: Option<AccessMode>) -> Result<Vec<Permission>, DatabaseError>;

    /// Insert or replace the single row for (role, resource)
    async fn upsert_permission(&self, grant: &PermissionGrant) -> Result<Permission, DatabaseError>;

    async fn list_clients(&self) -> Result<Vec<Client>, DatabaseError>;

    async fn find_client(&self, id: i64) -> Result<Option<Client>, DatabaseError>;

    async fn insert_client(&self, client: &NewClient) -> Result<Client, DatabaseError>;

    /// Deletes the client and, by cascade, all of its accounts
    async fn delete_client(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn client_detail(
        &self,
        id: i64,
        high_value_threshold: Decimal,
    ) -> Result<Option<ClientDetail>, DatabaseError>;

    /// Clients owning at least one account with `market_value > threshold`, each once
    async fn clients_above(&self, threshold: Decimal) -> Result<Vec<Client>, DatabaseError>;

    /// Inner join of a client with its accounts
    async fn client_accounts(&self, client_id: i64) -> Result<Option<Vec<ClientAccountRow>>, DatabaseError>;

    async fn list_accounts(&self, client_id: Option<i64>) -> Result<Vec<Account>, DatabaseError>;

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError>;

    /// `None` when the owning client does not exist
    async fn insert_account(&self, account: &NewAccount) -> Result<Option<Account>, DatabaseError>;

    async fn delete_account(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn insert_payload(&self, data: &str) -> Result<Payload, DatabaseError>;

    /// Newest first
    async fn list_payloads(&self) -> Result<Vec<Payload>, DatabaseError>;
}
