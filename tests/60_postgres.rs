//! PgStore against a live Postgres. Set TEST_DATABASE_URL to run these; each
//! test works in its own throwaway schema.

use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use client_access_api::auth::credentials::CredentialStore;
use client_access_api::database::models::{NewAccount, NewClient, PermissionGrant};
use client_access_api::database::{schema, AccessStore, DatabaseError, PgStore};

struct PgFixture {
    admin: PgPool,
    schema: String,
    store: PgStore,
}

impl PgFixture {
    async fn open() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping Postgres test");
            return Ok(None);
        };

        let schema_name = format!("test_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
        admin
            .execute(format!("CREATE SCHEMA {}", schema_name).as_str())
            .await?;

        let search_path = format!("SET search_path TO {}", schema_name);
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;
        schema::migrate(&pool).await?;

        Ok(Some(Self {
            admin,
            schema: schema_name,
            store: PgStore::new(pool),
        }))
    }

    async fn close(self) -> Result<()> {
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }

    async fn client(&self, name: &str) -> Result<i64> {
        let client = self
            .store
            .insert_client(&NewClient {
                display_name: name.to_string(),
                status: "Active".to_string(),
            })
            .await?;
        Ok(client.id)
    }

    async fn account(&self, client_id: i64, external_ref: Option<&str>, value: &str) -> Result<()> {
        self.store
            .insert_account(&NewAccount {
                client_id,
                external_ref: external_ref.map(str::to_string),
                market_value: Decimal::from_str(value)?,
                status: "Active".to_string(),
            })
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn deleting_a_client_removes_its_accounts() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let id = db.client("First").await?;
    db.account(id, Some("F12345"), "10.00").await?;
    db.account(id, None, "20.00").await?;

    assert!(db.store.delete_client(id).await?);
    assert!(db.store.list_accounts(Some(id)).await?.is_empty());
    assert!(!db.store.delete_client(id).await?);
    assert!(db.store.find_client(id).await?.is_none());
    assert!(db.store.client_detail(id, Decimal::from(50_000)).await?.is_none());

    db.close().await
}

#[tokio::test]
async fn fixture_clients_report_expected_counts() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let first = db.client("First").await?;
    let second = db.client("Second").await?;
    db.account(first, Some("F12345"), "100000.00").await?;
    db.account(first, None, "100.00").await?;
    db.account(second, None, "1.00").await?;

    let detail = db
        .store
        .client_detail(first, Decimal::from(50_000))
        .await?
        .ok_or_else(|| anyhow::anyhow!("client missing"))?;
    assert_eq!(detail.display_name, "First");
    assert_eq!(detail.unlinked_account_count, 1);
    assert_eq!(detail.linked_account_count, 1);
    assert_eq!(detail.high_value_peer_client_count, 1);

    let high: Vec<i64> = db
        .store
        .clients_above(Decimal::from(50_000))
        .await?
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(high, vec![first]);

    let rows = db.store.client_accounts(second).await?.unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert!(db.store.client_accounts(second + 100).await?.is_none());

    db.close().await
}

#[tokio::test]
async fn account_for_missing_client_is_not_created() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let created = db
        .store
        .insert_account(&NewAccount {
            client_id: 42,
            external_ref: None,
            market_value: Decimal::ONE,
            status: "Active".to_string(),
        })
        .await?;
    assert!(created.is_none());

    db.close().await
}

#[tokio::test]
async fn permission_upsert_keeps_one_row() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let grant = PermissionGrant {
        role_name: "auditor".to_string(),
        resource_name: "ClientsViewSet".to_string(),
        can_read: true,
        can_write: false,
    };
    let first = db.store.upsert_permission(&grant).await?;
    let second = db
        .store
        .upsert_permission(&PermissionGrant { can_write: true, ..grant })
        .await?;
    assert_eq!(first.id, second.id);

    let rows = db.store.list_permissions(None).await?;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].can_write);

    db.close().await
}

#[tokio::test]
async fn users_roles_and_conflicts() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let roles = vec!["admin".to_string(), "auditor".to_string()];
    db.store.insert_user("alice", "hash", &roles).await?;

    let user = db
        .store
        .find_by_username("alice")
        .await?
        .ok_or_else(|| anyhow::anyhow!("user missing"))?;
    assert_eq!(user.roles, roles);
    assert!(db.store.find_by_username("bob").await?.is_none());

    let err = db.store.insert_user("alice", "hash", &[]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)));

    db.close().await
}

#[tokio::test]
async fn payloads_are_listed_newest_first() -> Result<()> {
    let Some(db) = PgFixture::open().await? else { return Ok(()) };

    let older = db.store.insert_payload("hello").await?;
    let newer = db.store.insert_payload("world").await?;

    let ids: Vec<i64> = db.store.list_payloads().await?.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    db.close().await
}
