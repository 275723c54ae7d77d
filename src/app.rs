use anyhow::Context;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::auth::credentials::CredentialStore;
use crate::config::{AppConfig, StorageBackend};
use crate::database::{schema, seed, AccessStore, DatabaseManager, MemoryStore, PgStore};
use crate::handlers::{protected, public};
use crate::middleware::{capability_middleware, jwt_auth_middleware, Capability};
use crate::services::AccessService;
use crate::types::resource;

/// Shared per-process dependencies handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<AccessService>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn AccessStore>, credentials: Arc<dyn CredentialStore>) -> Self {
        let service = AccessService::new(store, config.reports.high_value_threshold);
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            credentials,
        }
    }

    /// State over a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::new(config, store.clone(), store.clone());
        (state, store)
    }
}

/// Storage handles for both trait seams, backed by the same store
pub struct Storage {
    pub access: Arc<dyn AccessStore>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// Connect the configured backend and create tables when it is Postgres
pub async fn open_storage(config: &AppConfig) -> anyhow::Result<Storage> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let manager = DatabaseManager::connect(config)
                .await
                .context("could not connect to database")?;
            manager
                .health_check()
                .await
                .context("database did not answer a ping")?;
            schema::migrate(manager.pool())
                .await
                .context("could not create database tables")?;
            let store = Arc::new(PgStore::new(manager.pool().clone()));
            Ok(Storage {
                access: store.clone(),
                credentials: store,
            })
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            Ok(Storage {
                access: store.clone(),
                credentials: store,
            })
        }
    }
}

/// Connect storage, create tables and seed demo data as configured.
/// Any failure here is fatal to the process.
pub async fn bootstrap(config: AppConfig) -> anyhow::Result<AppState> {
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }

    let Storage { access, credentials } = open_storage(&config).await?;

    if config.database.seed_demo_data {
        seed::seed_demo_data(&*access, &*credentials, config.security.bcrypt_cost)
            .await
            .context("could not seed demo data")?;
    }

    Ok(AppState::new(config, access, credentials))
}

pub fn router(state: AppState) -> Router {
    let protected = protected_routes(&state)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(public::auth::login))
        // Protected API
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

/// Every route here needs a bearer token. Route groups tied to a resource also
/// need read (GET) or write (other methods) capability on it.
fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{accounts, auth, clients, payloads, permissions, reports};

    let permission_admin = Router::new()
        .route("/api/permissions", get(permissions::list))
        .route("/api/permissions/:role/:resource", put(permissions::grant));

    let client_routes = Router::new()
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/high-value", get(clients::high_value))
        .route("/api/clients/:id", get(clients::show).delete(clients::delete))
        .route("/api/clients/:id/detailed_info", get(clients::detailed_info))
        .route("/api/clients/:id/accounts", get(clients::accounts))
        .route("/api/reports/complex-queries", get(reports::complex_queries));

    let account_routes = Router::new()
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route("/api/accounts/:id", get(accounts::show).delete(accounts::delete));

    let payload_routes = Router::new().route("/api/data", get(payloads::list).post(payloads::create));

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/permissions/check", get(permissions::check))
        .merge(gated(state, resource::PERMISSIONS, permission_admin))
        .merge(gated(state, resource::CLIENTS, client_routes))
        .merge(gated(state, resource::ACCOUNTS, account_routes))
        .merge(gated(state, resource::PAYLOADS, payload_routes))
}

fn gated(state: &AppState, resource: &'static str, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        Capability::new(state.clone(), resource),
        capability_middleware,
    ))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Client Access API",
            "version": version,
            "endpoints": {
                "login": "POST /auth/login (public)",
                "whoami": "GET /api/auth/whoami",
                "clients": "/api/clients[/:id[/detailed_info|/accounts]] (ClientsViewSet)",
                "high_value": "GET /api/clients/high-value?threshold= (ClientsViewSet)",
                "accounts": "/api/accounts[/:id] (AccountsViewSet)",
                "reports": "GET /api/reports/complex-queries (ClientsViewSet)",
                "permissions": "/api/permissions[/check|/:role/:resource] (PermissionsAdmin)",
                "data": "GET|POST /api/data (PayloadsViewSet)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
