use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::models::account::DEFAULT_ACCOUNT_STATUS;
use crate::database::models::client::DEFAULT_CLIENT_STATUS;
use crate::database::models::{
    Account, Client, ClientAccountRow, ClientDetail, NewAccount, NewClient, Payload, Permission,
    PermissionGrant,
};
use crate::database::store::AccessStore;
use crate::types::AccessMode;

use super::error::ServiceError;
use super::validation;

/// Fixed market value above which a client counts toward
/// `ClientDetail::high_value_peer_client_count`
pub const PEER_COUNT_THRESHOLD: i64 = 50_000;

/// Request body for client creation
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub display_name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for account creation. `market_value` stays raw JSON so a
/// malformed amount is reported as a validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInput {
    pub client_id: i64,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub market_value: Value,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for `POST /api/data`
#[derive(Debug, Clone, Deserialize)]
pub struct PayloadInput {
    #[serde(default)]
    pub message: Option<String>,
}

/// The join, subquery and boolean-filter queries bundled into one report
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub join_query: Vec<ClientAccountRow>,
    pub subquery_query: Vec<Client>,
    pub permission_query: Vec<String>,
}

/// Authorization plus the fixed client/account query set
pub struct AccessService {
    store: Arc<dyn AccessStore>,
    high_value_threshold: Decimal,
}

impl AccessService {
    pub fn new(store: Arc<dyn AccessStore>, high_value_threshold: Decimal) -> Self {
        Self {
            store,
            high_value_threshold,
        }
    }

    pub fn high_value_threshold(&self) -> Decimal {
        self.high_value_threshold
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }

    /// True iff any role holds a permission on `resource` granting `mode`.
    /// A missing permission row is a denial, never an error.
    pub async fn authorize(
        &self,
        role_names: &BTreeSet<String>,
        resource_name: &str,
        mode: AccessMode,
    ) -> Result<bool, ServiceError> {
        if role_names.is_empty() {
            return Ok(false);
        }
        let roles: Vec<String> = role_names.iter().cloned().collect();
        let allowed = self.store.has_permission(&roles, resource_name, mode).await?;
        debug!(?roles, resource = resource_name, %mode, allowed, "authorization check");
        Ok(allowed)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, ServiceError> {
        Ok(self.store.list_clients().await?)
    }

    pub async fn get_client(&self, client_id: i64) -> Result<Client, ServiceError> {
        self.store
            .find_client(client_id)
            .await?
            .ok_or_else(|| ServiceError::client_not_found(client_id))
    }

    pub async fn create_client(&self, input: ClientInput) -> Result<Client, ServiceError> {
        let client = NewClient {
            display_name: validation::validate_display_name(&input.display_name)?,
            status: validation::normalize_status(input.status, DEFAULT_CLIENT_STATUS)?,
        };
        let created = self.store.insert_client(&client).await?;
        info!("Created client {} ({})", created.id, created.display_name);
        Ok(created)
    }

    /// Removes the client together with all of its accounts
    pub async fn delete_client(&self, client_id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_client(client_id).await? {
            return Err(ServiceError::client_not_found(client_id));
        }
        info!("Deleted client {} and its accounts", client_id);
        Ok(())
    }

    /// Account breakdown for one client. The peer count is table-wide: it
    /// counts every client holding an account above `PEER_COUNT_THRESHOLD`,
    /// independent of the configured report threshold.
    pub async fn client_detail(&self, client_id: i64) -> Result<ClientDetail, ServiceError> {
        self.store
            .client_detail(client_id, Decimal::from(PEER_COUNT_THRESHOLD))
            .await?
            .ok_or_else(|| ServiceError::client_not_found(client_id))
    }

    pub async fn create_account(&self, input: AccountInput) -> Result<Account, ServiceError> {
        let account = NewAccount {
            client_id: input.client_id,
            external_ref: validation::normalize_external_ref(input.external_ref)?,
            market_value: validation::parse_money("market_value", &input.market_value)?,
            status: validation::normalize_status(input.status, DEFAULT_ACCOUNT_STATUS)?,
        };

        let created = self
            .store
            .insert_account(&account)
            .await?
            .ok_or_else(|| ServiceError::client_not_found(input.client_id))?;
        info!("Created account {} for client {}", created.id, created.client_id);
        Ok(created)
    }

    /// Clients with at least one account strictly above `threshold`, each listed once
    pub async fn high_value_clients(&self, threshold: Decimal) -> Result<Vec<Client>, ServiceError> {
        Ok(self.store.clients_above(threshold).await?)
    }

    /// Empty when the client has no accounts; NotFound only when the client is absent
    pub async fn join_clients_accounts(&self, client_id: i64) -> Result<Vec<ClientAccountRow>, ServiceError> {
        self.store
            .client_accounts(client_id)
            .await?
            .ok_or_else(|| ServiceError::client_not_found(client_id))
    }

    pub async fn list_accounts(&self, client_id: Option<i64>) -> Result<Vec<Account>, ServiceError> {
        Ok(self.store.list_accounts(client_id).await?)
    }

    pub async fn get_account(&self, account_id: i64) -> Result<Account, ServiceError> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or_else(|| ServiceError::account_not_found(account_id))
    }

    pub async fn delete_account(&self, account_id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_account(account_id).await? {
            return Err(ServiceError::account_not_found(account_id));
        }
        info!("Deleted account {}", account_id);
        Ok(())
    }

    pub async fn list_permissions(&self, mode: Option<AccessMode>) -> Result<Vec<Permission>, ServiceError> {
        Ok(self.store.list_permissions(mode).await?)
    }

    /// Names are trimmed before storage so they match role names carried in tokens
    pub async fn grant_permission(&self, grant: PermissionGrant) -> Result<Permission, ServiceError> {
        let grant = PermissionGrant {
            role_name: grant.role_name.trim().to_string(),
            resource_name: grant.resource_name.trim().to_string(),
            ..grant
        };
        if grant.role_name.is_empty() {
            return Err(ServiceError::validation("role", "must not be empty"));
        }
        if grant.resource_name.is_empty() {
            return Err(ServiceError::validation("resource", "must not be empty"));
        }
        let permission = self.store.upsert_permission(&grant).await?;
        info!(
            "Granted {} on {} (read={}, write={})",
            permission.role_name, permission.resource_name, permission.can_read, permission.can_write
        );
        Ok(permission)
    }

    pub async fn create_payload(&self, input: PayloadInput) -> Result<Payload, ServiceError> {
        let message = validation::validate_payload_message(input.message)?;
        let payload = self.store.insert_payload(&message).await?;
        info!("Stored payload {}", payload.id);
        Ok(payload)
    }

    /// Stored payloads, newest first
    pub async fn list_payloads(&self) -> Result<Vec<Payload>, ServiceError> {
        Ok(self.store.list_payloads().await?)
    }

    /// Join for `client_id`, clients above the configured threshold, and the
    /// distinct roles holding read access anywhere
    pub async fn query_report(&self, client_id: i64) -> Result<QueryReport, ServiceError> {
        let join_query = self
            .store
            .client_accounts(client_id)
            .await?
            .unwrap_or_default();
        let subquery_query = self.store.clients_above(self.high_value_threshold).await?;
        let permission_query: BTreeSet<String> = self
            .store
            .list_permissions(Some(AccessMode::Read))
            .await?
            .into_iter()
            .map(|p| p.role_name)
            .collect();

        Ok(QueryReport {
            join_query,
            subquery_query,
            permission_query: permission_query.into_iter().collect(),
        })
    }
}
