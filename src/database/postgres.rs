use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::auth::credentials::CredentialStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Account, Client, ClientAccountRow, ClientDetail, NewAccount, NewClient, Payload, Permission,
    PermissionGrant, UserCredential,
};
use crate::database::store::AccessStore;
use crate::types::AccessMode;

const CLIENT_COLUMNS: &str = "id, display_name, status, created_at";
const ACCOUNT_COLUMNS: &str = "id, client_id, external_ref, market_value, status";

const PERMISSION_SELECT: &str = r#"
    SELECT p.id, r.name AS role_name, s.name AS resource_name, p.can_read, p.can_write
    FROM permissions p
    JOIN roles r ON r.id = p.role_id
    JOIN resources s ON s.id = p.resource_id
"#;

/// PostgreSQL-backed store; every method checks connections out of the pool
/// and returns them when the guard drops, on success and error paths alike.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn has_permission(
        &self,
        roles: &[String],
        resource: &str,
        mode: AccessMode,
    ) -> Result<bool, DatabaseError> {
        if roles.is_empty() {
            return Ok(false);
        }

        let sql = format!(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM permissions p
                JOIN roles r ON r.id = p.role_id
                JOIN resources s ON s.id = p.resource_id
                WHERE r.name = ANY($1) AND s.name = $2 AND p.{} = TRUE
            )
            "#,
            mode.column()
        );

        let allowed: bool = sqlx::query_scalar(&sql)
            .bind(roles.to_vec())
            .bind(resource)
            .fetch_one(&self.pool)
            .await?;
        Ok(allowed)
    }

    async fn list_permissions(&self, mode: Option<AccessMode>) -> Result<Vec<Permission>, DatabaseError> {
        let filter = match mode {
            Some(mode) => format!("WHERE p.{} = TRUE", mode.column()),
            None => String::new(),
        };
        let sql = format!("{} {} ORDER BY r.name, s.name", PERMISSION_SELECT, filter);

        let rows = sqlx::query_as::<_, Permission>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn upsert_permission(&self, grant: &PermissionGrant) -> Result<Permission, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let role_id: i64 = sqlx::query_scalar(
            "INSERT INTO roles (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(&grant.role_name)
        .fetch_one(&mut *tx)
        .await?;

        let resource_id: i64 = sqlx::query_scalar(
            "INSERT INTO resources (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(&grant.resource_name)
        .fetch_one(&mut *tx)
        .await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO permissions (role_id, resource_id, can_read, can_write)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (role_id, resource_id)
             DO UPDATE SET can_read = EXCLUDED.can_read, can_write = EXCLUDED.can_write
             RETURNING id",
        )
        .bind(role_id)
        .bind(resource_id)
        .bind(grant.can_read)
        .bind(grant.can_write)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Permission {
            id,
            role_name: grant.role_name.clone(),
            resource_name: grant.resource_name.clone(),
            can_read: grant.can_read,
            can_write: grant.can_write,
        })
    }

    async fn list_clients(&self) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clients ORDER BY id", CLIENT_COLUMNS);
        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    async fn find_client(&self, id: i64) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS);
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    async fn insert_client(&self, client: &NewClient) -> Result<Client, DatabaseError> {
        let sql = format!(
            "INSERT INTO clients (display_name, status) VALUES ($1, $2) RETURNING {}",
            CLIENT_COLUMNS
        );
        let created = sqlx::query_as::<_, Client>(&sql)
            .bind(&client.display_name)
            .bind(&client.status)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn delete_client(&self, id: i64) -> Result<bool, DatabaseError> {
        // accounts.client_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn client_detail(
        &self,
        id: i64,
        high_value_threshold: Decimal,
    ) -> Result<Option<ClientDetail>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;

        let display_name: Option<String> =
            sqlx::query_scalar("SELECT display_name FROM clients WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        let Some(display_name) = display_name else {
            return Ok(None);
        };

        let (unlinked, linked): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE external_ref IS NULL),
                COUNT(*) FILTER (WHERE external_ref IS NOT NULL)
            FROM accounts
            WHERE client_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        let peers: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients
             WHERE id IN (SELECT client_id FROM accounts WHERE market_value > $1)",
        )
        .bind(high_value_threshold)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(ClientDetail {
            display_name,
            unlinked_account_count: unlinked,
            linked_account_count: linked,
            high_value_peer_client_count: peers,
        }))
    }

    async fn clients_above(&self, threshold: Decimal) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM clients
             WHERE id IN (SELECT client_id FROM accounts WHERE market_value > $1)
             ORDER BY id",
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    async fn client_accounts(&self, client_id: i64) -> Result<Option<Vec<ClientAccountRow>>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, ClientAccountRow>(
            r#"
            SELECT c.id AS client_id, c.display_name, a.id AS account_id, a.external_ref
            FROM clients c
            INNER JOIN accounts a ON c.id = a.client_id
            WHERE c.id = $1
            ORDER BY a.id
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(rows))
    }

    async fn list_accounts(&self, client_id: Option<i64>) -> Result<Vec<Account>, DatabaseError> {
        let accounts = match client_id {
            Some(client_id) => {
                let sql = format!(
                    "SELECT {} FROM accounts WHERE client_id = $1 ORDER BY id",
                    ACCOUNT_COLUMNS
                );
                sqlx::query_as::<_, Account>(&sql)
                    .bind(client_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLUMNS);
                sqlx::query_as::<_, Account>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(accounts)
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Option<Account>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Hold the parent row so a concurrent delete cannot orphan the insert
        let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = $1 FOR SHARE")
            .bind(account.client_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owner.is_none() {
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO accounts (client_id, external_ref, market_value, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Account>(&sql)
            .bind(account.client_id)
            .bind(&account.external_ref)
            .bind(account.market_value)
            .bind(&account.status)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from);

        let created = match inserted {
            Ok(created) => created,
            Err(e) if e.is_foreign_key_violation() => return Ok(None),
            Err(e) => return Err(e),
        };

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn delete_account(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_payload(&self, data: &str) -> Result<Payload, DatabaseError> {
        let payload = sqlx::query_as::<_, Payload>(
            "INSERT INTO payloads (data) VALUES ($1) RETURNING id, data, created_at",
        )
        .bind(data)
        .fetch_one(&self.pool)
        .await?;
        Ok(payload)
    }

    async fn list_payloads(&self) -> Result<Vec<Payload>, DatabaseError> {
        let payloads = sqlx::query_as::<_, Payload>(
            "SELECT id, data, created_at FROM payloads ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(payloads)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserCredential>, DatabaseError> {
        let user = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT
                u.id,
                u.username,
                u.password_hash,
                COALESCE(
                    array_agg(r.name::text ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
                    '{}'::text[]
                ) AS roles
            FROM users u
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            WHERE u.username = $1
            GROUP BY u.id, u.username, u.password_hash
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<UserCredential, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             ON CONFLICT (username) DO NOTHING
             RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&mut *tx)
        .await?;
        let id = id.ok_or_else(|| DatabaseError::Conflict(format!("user '{}' already exists", username)))?;

        let mut role_names = roles.to_vec();
        role_names.sort();
        role_names.dedup();

        for role in &role_names {
            let role_id: i64 = sqlx::query_scalar(
                "INSERT INTO roles (name) VALUES ($1)
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                 RETURNING id",
            )
            .bind(role)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(UserCredential {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            roles: role_names,
        })
    }
}
